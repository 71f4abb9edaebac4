//! Blob entity model.

use sqlx::FromRow;

use dataroom_core::types::BlobId;

/// An opaque binary payload owned by exactly one file node.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Blob {
    /// Unique blob identifier.
    pub id: BlobId,
    /// Raw content.
    pub data: Vec<u8>,
}

impl Blob {
    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a zero-length payload.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
