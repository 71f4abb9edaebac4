//! Room repository implementation.

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use dataroom_core::error::{AppError, ErrorKind};
use dataroom_core::result::AppResult;
use dataroom_core::types::{BlobId, NodeId, RoomId, now_millis};
use dataroom_entity::room::Room;

use super::blob::BlobRepository;
use super::{delete_by_ids, require_name};

/// Repository for rooms, the top-level namespaces that own node trees.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    /// Create a new room repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All rooms, oldest first.
    pub async fn list_rooms(&self) -> AppResult<Vec<Room>> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY created_at ASC, rowid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to retrieve rooms", e))
    }

    /// Find a room by ID.
    pub async fn get_room(&self, id: RoomId) -> AppResult<Option<Room>> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to find room", e))
    }

    /// Create a room with a trimmed, non-blank name.
    pub async fn create_room(&self, name: &str) -> AppResult<Room> {
        let name = require_name(name, "Room")?;
        let now = now_millis();
        let room = Room {
            id: RoomId::new(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query("INSERT INTO rooms (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(room.id)
            .bind(&room.name)
            .bind(room.created_at)
            .bind(room.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to create room", e))?;

        info!(room_id = %room.id, name = %room.name, "Room created");
        Ok(room)
    }

    /// Rename a room, returning the number of records updated (0 or 1).
    pub async fn rename_room(&self, id: RoomId, name: &str) -> AppResult<u64> {
        require_room_id(id)?;
        let name = require_name(name, "Room")?;

        let result = sqlx::query("UPDATE rooms SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to rename room", e))?;

        let updated = result.rows_affected();
        info!(room_id = %id, name = %name, updated, "Room renamed");
        Ok(updated)
    }

    /// Delete a room together with all of its nodes and their payloads.
    ///
    /// Gathering and deleting happen in one transaction; any failure leaves
    /// the room fully intact.
    pub async fn delete_room(&self, id: RoomId) -> AppResult<()> {
        require_room_id(id)?;
        let storage_failure = |e: sqlx::Error| {
            AppError::with_source(
                ErrorKind::Storage,
                "Failed to delete room and its associated data",
                e,
            )
        };

        let mut tx = self.pool.begin().await.map_err(storage_failure)?;

        let node_ids: Vec<NodeId> = sqlx::query_scalar("SELECT id FROM nodes WHERE room_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .map_err(storage_failure)?;

        if node_ids.is_empty() {
            sqlx::query("DELETE FROM rooms WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(storage_failure)?;
            tx.commit().await.map_err(storage_failure)?;
            info!(room_id = %id, "Empty room deleted");
            return Ok(());
        }

        let blob_ids: Vec<BlobId> = sqlx::query_scalar(
            "SELECT blob_id FROM nodes \
             WHERE room_id = ? AND node_type = 'file' AND blob_id IS NOT NULL",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(storage_failure)?;
        debug!(
            room_id = %id,
            nodes = node_ids.len(),
            blobs = blob_ids.len(),
            "Gathered room contents"
        );

        if !blob_ids.is_empty() {
            BlobRepository::delete_many(&mut tx, &blob_ids)
                .await
                .map_err(room_delete_failure)?;
        }
        let raw: Vec<Uuid> = node_ids.iter().map(|id| id.into_uuid()).collect();
        delete_by_ids(&mut tx, "nodes", &raw)
            .await
            .map_err(storage_failure)?;
        sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_failure)?;
        tx.commit().await.map_err(storage_failure)?;

        info!(
            room_id = %id,
            nodes = node_ids.len(),
            blobs = blob_ids.len(),
            "Room deleted"
        );
        Ok(())
    }
}

fn require_room_id(id: RoomId) -> AppResult<()> {
    if id.is_nil() {
        return Err(AppError::invalid_argument(
            "Room ID is required and must be a non-empty string",
        ));
    }
    Ok(())
}

fn room_delete_failure(e: AppError) -> AppError {
    AppError::with_source(
        ErrorKind::Storage,
        "Failed to delete room and its associated data",
        e,
    )
}
