//! Blob repository implementation.

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use dataroom_core::error::{AppError, ErrorKind};
use dataroom_core::result::AppResult;
use dataroom_core::traits::BlobStore;
use dataroom_core::types::BlobId;
use dataroom_entity::blob::Blob;

use super::delete_by_ids;

/// Repository for binary payloads keyed by generated id.
#[derive(Debug, Clone)]
pub struct BlobRepository {
    pool: SqlitePool,
}

impl BlobRepository {
    /// Create a new blob repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a blob record by ID.
    pub async fn find_by_id(&self, id: BlobId) -> AppResult<Option<Blob>> {
        sqlx::query_as::<_, Blob>("SELECT id, data FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to find blob", e))
    }

    /// Count all stored blobs.
    pub async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blobs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to count blobs", e))?;
        Ok(count as u64)
    }

    /// Insert a payload on an open connection or transaction.
    pub(crate) async fn insert(conn: &mut SqliteConnection, data: &[u8]) -> AppResult<BlobId> {
        let id = BlobId::new();
        sqlx::query("INSERT INTO blobs (id, data) VALUES (?, ?)")
            .bind(id)
            .bind(data)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to create blob", e))?;
        debug!(blob_id = %id, size = data.len(), "Blob stored");
        Ok(id)
    }

    /// Delete payloads on an open connection or transaction.
    pub(crate) async fn delete_many(conn: &mut SqliteConnection, ids: &[BlobId]) -> AppResult<u64> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        delete_by_ids(conn, "blobs", &ids)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to delete blobs", e))
    }
}

#[async_trait]
impl BlobStore for BlobRepository {
    async fn create_blob(&self, data: Bytes) -> AppResult<BlobId> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to acquire connection", e)
        })?;
        Self::insert(&mut conn, &data).await
    }

    async fn get_blob(&self, id: BlobId) -> AppResult<Option<Bytes>> {
        Ok(self.find_by_id(id).await?.map(|blob| Bytes::from(blob.data)))
    }

    async fn delete_blob(&self, id: BlobId) -> AppResult<()> {
        self.bulk_delete(&[id]).await
    }

    async fn bulk_delete(&self, ids: &[BlobId]) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to acquire connection", e)
        })?;
        let removed = Self::delete_many(&mut conn, ids).await?;
        debug!(requested = ids.len(), removed, "Blobs deleted");
        Ok(())
    }
}
