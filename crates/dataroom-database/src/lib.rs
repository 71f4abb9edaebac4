//! # dataroom-database
//!
//! Embedded SQLite handle and concrete repository implementations for the
//! data room: blobs, nodes (the folder/file tree) and rooms.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{BlobRepository, NodeRepository, RoomRepository};
