//! Blob domain entities.

pub mod model;

pub use model::Blob;
