//! Blob store contract.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;
use crate::types::BlobId;

/// Keyed binary storage.
///
/// Payloads are addressed by a freshly generated [`BlobId`], never by a
/// content hash, and are opaque to the store. Each blob is owned by exactly
/// one file node; the node repositories create and reclaim blobs inside their
/// own transactions, so this trait is the standalone surface used for
/// previews and exports.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Store `data` under a new identifier and return it.
    async fn create_blob(&self, data: Bytes) -> AppResult<BlobId>;

    /// Fetch a payload. A missing id yields `Ok(None)`, never an error.
    async fn get_blob(&self, id: BlobId) -> AppResult<Option<Bytes>>;

    /// Delete a payload. Deleting an absent id is a no-op.
    async fn delete_blob(&self, id: BlobId) -> AppResult<()>;

    /// Delete several payloads at once. Absent ids are skipped.
    async fn bulk_delete(&self, ids: &[BlobId]) -> AppResult<()>;
}
