//! Trait definitions for pluggable backends.

pub mod blob_store;

pub use blob_store::BlobStore;
