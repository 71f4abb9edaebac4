//! Node repository implementation.
//!
//! Folders and files form one tree per room, linked by `parent_id`. Names
//! are unique per `(room_id, parent_id)` group, compared case-insensitively
//! through the stored `name_lower` column. Every operation that touches more
//! than one table runs in a single transaction.

use std::collections::{HashSet, VecDeque};

use bytes::Bytes;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use dataroom_core::error::{AppError, ErrorKind};
use dataroom_core::result::AppResult;
use dataroom_core::types::{BlobId, NodeId, RoomId, now_millis};
use dataroom_entity::node::{Node, NodeType, NewFile, PDF_MIME, ensure_unique_name};

use super::blob::BlobRepository;
use super::{delete_by_ids, reject_blank, write_error};

/// Upper bound on ancestor hops when building a breadcrumb trail.
const MAX_DEPTH: i64 = 4096;

/// Repository for the folder/file tree.
#[derive(Debug, Clone)]
pub struct NodeRepository {
    pool: SqlitePool,
}

impl NodeRepository {
    /// Create a new node repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a node by ID.
    pub async fn get_node(&self, id: NodeId) -> AppResult<Option<Node>> {
        let mut conn = self.acquire().await?;
        Self::find(&mut conn, id).await
    }

    /// All direct children of `parent_id` within `room_id`, in storage order.
    pub async fn list_children(
        &self,
        room_id: RoomId,
        parent_id: Option<NodeId>,
    ) -> AppResult<Vec<Node>> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE room_id = ? AND parent_id IS ?")
            .bind(room_id)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to list children", e))
    }

    /// Direct children ordered folders first, then by name (case-sensitive).
    ///
    /// Returns an empty list when no room is selected.
    pub async fn get_nodes_by_parent(
        &self,
        room_id: Option<RoomId>,
        parent_id: Option<NodeId>,
    ) -> AppResult<Vec<Node>> {
        let Some(room_id) = room_id else {
            return Ok(Vec::new());
        };

        let nodes = sqlx::query_as::<_, Node>(
            "SELECT * FROM nodes WHERE room_id = ? AND parent_id IS ? \
             ORDER BY CASE node_type WHEN 'folder' THEN 0 ELSE 1 END, name ASC",
        )
        .bind(room_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to list children", e))?;

        debug!(room_id = %room_id, count = nodes.len(), "Listed children");
        Ok(nodes)
    }

    /// Lowercased names occupying the `(room_id, parent_id)` sibling group.
    pub async fn list_sibling_name_set(
        &self,
        room_id: RoomId,
        parent_id: Option<NodeId>,
    ) -> AppResult<HashSet<String>> {
        let mut conn = self.acquire().await?;
        Self::sibling_names(&mut conn, room_id, parent_id).await
    }

    /// Create a folder, suffixing the name if a sibling already uses it.
    pub async fn create_folder(
        &self,
        room_id: RoomId,
        parent_id: Option<NodeId>,
        name: &str,
    ) -> AppResult<Node> {
        reject_blank(name, "Folder")?;

        let mut tx = self.begin().await?;
        Self::ensure_placement(&mut tx, room_id, parent_id).await?;
        let existing = Self::sibling_names(&mut tx, room_id, parent_id).await?;
        let safe = ensure_unique_name(name, &existing);

        let node = Node::new_folder(room_id, parent_id, safe, now_millis());
        Self::insert(&mut tx, &node)
            .await
            .map_err(|e| write_error(e, "Failed to create folder"))?;
        Self::commit(tx, "Failed to create folder").await?;

        info!(
            room_id = %room_id,
            node_id = %node.id,
            name = %node.name,
            "Folder created"
        );
        Ok(node)
    }

    /// Store a PDF and its file node as one unit, returning the node id.
    ///
    /// Any other media type is rejected before storage is touched. If the
    /// node insert fails, the payload written just before it is rolled back.
    pub async fn create_file(
        &self,
        room_id: RoomId,
        parent_id: Option<NodeId>,
        file: NewFile,
    ) -> AppResult<NodeId> {
        if !file.is_pdf() {
            return Err(AppError::unsupported_type(format!(
                "Only PDF is supported (got '{}')",
                file.mime
            )));
        }
        reject_blank(&file.name, "File")?;

        let mut tx = self.begin().await?;
        Self::ensure_placement(&mut tx, room_id, parent_id).await?;
        let existing = Self::sibling_names(&mut tx, room_id, parent_id).await?;
        let safe = ensure_unique_name(&file.name, &existing);

        let blob_id = BlobRepository::insert(&mut tx, &file.data).await?;
        let node = Node::new_file(
            room_id,
            parent_id,
            safe,
            file.size(),
            PDF_MIME,
            blob_id,
            now_millis(),
        );
        Self::insert(&mut tx, &node)
            .await
            .map_err(|e| write_error(e, "Failed to create file"))?;
        Self::commit(tx, "Failed to create file").await?;

        info!(
            room_id = %room_id,
            node_id = %node.id,
            blob_id = %blob_id,
            name = %node.name,
            size = file.size(),
            "File uploaded"
        );
        Ok(node.id)
    }

    /// Rename a node, suffixing the name if a sibling already uses it.
    ///
    /// A missing node is a no-op, as is a rename whose result only differs
    /// from the current name by case.
    pub async fn rename_node(&self, id: NodeId, new_name: &str) -> AppResult<()> {
        reject_blank(new_name, "Node")?;

        let mut tx = self.begin().await?;
        let Some(mut node) = Self::find(&mut tx, id).await? else {
            debug!(node_id = %id, "Rename skipped, node not found");
            return Ok(());
        };

        let mut existing = Self::sibling_names(&mut tx, node.room_id, node.parent_id).await?;
        existing.remove(&node.name_lower);
        let safe = ensure_unique_name(new_name, &existing);
        if safe.to_lowercase() == node.name_lower {
            debug!(node_id = %id, "Rename skipped, name unchanged");
            return Ok(());
        }

        let old_name = std::mem::take(&mut node.name);
        node.set_name(safe, now_millis());
        sqlx::query("UPDATE nodes SET name = ?, name_lower = ?, updated_at = ? WHERE id = ?")
            .bind(&node.name)
            .bind(&node.name_lower)
            .bind(node.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Failed to rename node"))?;
        Self::commit(tx, "Failed to rename node").await?;

        info!(
            node_id = %id,
            old_name = %old_name,
            new_name = %node.name,
            "Node renamed"
        );
        Ok(())
    }

    /// Breadth-first ids of the subtree rooted at `root_id`, root first.
    pub async fn collect_descendants_bfs(&self, root_id: NodeId) -> AppResult<Vec<NodeId>> {
        let mut conn = self.acquire().await?;
        Self::descendants(&mut conn, root_id).await
    }

    /// Delete a node, its whole subtree and every payload the subtree owns.
    pub async fn delete_cascade(&self, id: NodeId) -> AppResult<()> {
        let mut tx = self.begin().await?;

        let ids = Self::descendants(&mut tx, id).await?;
        let nodes = Self::find_many(&mut tx, &ids).await?;
        let blob_ids: Vec<BlobId> = nodes
            .iter()
            .filter(|node| node.is_file())
            .filter_map(|node| node.blob_id)
            .collect();

        if !blob_ids.is_empty() {
            BlobRepository::delete_many(&mut tx, &blob_ids).await?;
        }
        let raw: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let removed = delete_by_ids(&mut tx, "nodes", &raw)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to delete nodes", e))?;
        Self::commit(tx, "Failed to delete nodes").await?;

        info!(
            node_id = %id,
            nodes = removed,
            blobs = blob_ids.len(),
            "Node subtree deleted"
        );
        Ok(())
    }

    /// Walk folder names from the room's top level.
    ///
    /// Every segment, including the last, must match a folder
    /// case-insensitively. Returns `None` on the first miss or for an empty
    /// path.
    pub async fn resolve_path<S: AsRef<str>>(
        &self,
        room_id: RoomId,
        segments: &[S],
    ) -> AppResult<Option<Node>> {
        let mut conn = self.acquire().await?;
        let mut parent_id: Option<NodeId> = None;
        let mut current: Option<Node> = None;

        for segment in segments {
            let lower = segment.as_ref().to_lowercase();
            let found = sqlx::query_as::<_, Node>(
                "SELECT * FROM nodes \
                 WHERE room_id = ? AND parent_id IS ? AND name_lower = ? AND node_type = ? \
                 LIMIT 1",
            )
            .bind(room_id)
            .bind(parent_id)
            .bind(&lower)
            .bind(NodeType::Folder)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to resolve path", e))?;

            let Some(node) = found else {
                return Ok(None);
            };
            parent_id = Some(node.id);
            current = Some(node);
        }

        Ok(current)
    }

    /// Breadcrumb trail: the chain from the top level down to `id` inclusive.
    ///
    /// Empty when `id` does not exist.
    pub async fn ancestors(&self, id: NodeId) -> AppResult<Vec<Node>> {
        sqlx::query_as::<_, Node>(
            "WITH RECURSIVE chain (id, parent_id, depth) AS ( \
                SELECT id, parent_id, 0 FROM nodes WHERE id = ? \
                UNION ALL \
                SELECT n.id, n.parent_id, c.depth + 1 \
                FROM nodes n INNER JOIN chain c ON n.id = c.parent_id \
                WHERE c.depth < ? \
             ) \
             SELECT n.* FROM nodes n INNER JOIN chain c ON n.id = c.id ORDER BY c.depth DESC",
        )
        .bind(id)
        .bind(MAX_DEPTH)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to find ancestors", e))
    }

    /// A file node together with its payload, for preview or export.
    ///
    /// `None` when the node is missing, is a folder, or its payload is gone.
    pub async fn read_file(&self, id: NodeId) -> AppResult<Option<(Node, Bytes)>> {
        let mut conn = self.acquire().await?;
        let Some(node) = Self::find(&mut conn, id).await? else {
            return Ok(None);
        };
        let Some(blob_id) = node.blob_id.filter(|_| node.is_file()) else {
            return Ok(None);
        };

        let data: Option<Vec<u8>> = sqlx::query_scalar("SELECT data FROM blobs WHERE id = ?")
            .bind(blob_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to read file", e))?;

        if data.is_none() {
            warn!(node_id = %id, blob_id = %blob_id, "File node references a missing blob");
        }
        Ok(data.map(|bytes| (node, Bytes::from(bytes))))
    }

    /// Count all nodes owned by a room.
    pub async fn count_in_room(&self, room_id: RoomId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE room_id = ?")
            .bind(room_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to count nodes", e))?;
        Ok(count as u64)
    }

    async fn acquire(&self) -> AppResult<sqlx::pool::PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to acquire connection", e)
        })
    }

    async fn begin(&self) -> AppResult<sqlx::Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to begin transaction", e)
        })
    }

    async fn commit(tx: sqlx::Transaction<'static, Sqlite>, context: &str) -> AppResult<()> {
        tx.commit().await.map_err(|e| write_error(e, context))
    }

    async fn find(conn: &mut SqliteConnection, id: NodeId) -> AppResult<Option<Node>> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to find node", e))
    }

    async fn find_many(conn: &mut SqliteConnection, ids: &[NodeId]) -> AppResult<Vec<Node>> {
        let mut nodes = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(500) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT * FROM nodes WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
            let batch = builder
                .build_query_as::<Node>()
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to fetch nodes", e)
                })?;
            nodes.extend(batch);
        }
        Ok(nodes)
    }

    async fn sibling_names(
        conn: &mut SqliteConnection,
        room_id: RoomId,
        parent_id: Option<NodeId>,
    ) -> AppResult<HashSet<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name_lower FROM nodes WHERE room_id = ? AND parent_id IS ?")
                .bind(room_id)
                .bind(parent_id)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to list sibling names", e)
                })?;
        Ok(names.into_iter().collect())
    }

    /// Verify the room exists and `parent_id`, if set, is a folder in it.
    async fn ensure_placement(
        conn: &mut SqliteConnection,
        room_id: RoomId,
        parent_id: Option<NodeId>,
    ) -> AppResult<()> {
        let rooms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE id = ?")
            .bind(room_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to find room", e))?;
        if rooms == 0 {
            return Err(AppError::invalid_argument(format!(
                "Room {room_id} does not exist"
            )));
        }

        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        match Self::find(conn, parent_id).await? {
            Some(parent) if parent.room_id == room_id && parent.is_folder() => Ok(()),
            Some(parent) if parent.room_id != room_id => Err(AppError::invalid_argument(format!(
                "Parent {parent_id} belongs to another room"
            ))),
            Some(_) => Err(AppError::invalid_argument(format!(
                "Parent {parent_id} is not a folder"
            ))),
            None => Err(AppError::invalid_argument(format!(
                "Parent folder {parent_id} does not exist"
            ))),
        }
    }

    async fn descendants(conn: &mut SqliteConnection, root_id: NodeId) -> AppResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([root_id]);
        let mut queue = VecDeque::from([root_id]);

        while let Some(current) = queue.pop_front() {
            out.push(current);
            let children: Vec<NodeId> = sqlx::query_scalar("SELECT id FROM nodes WHERE parent_id = ?")
                .bind(current)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to list descendants", e)
                })?;

            for child in children {
                if seen.insert(child) {
                    queue.push_back(child);
                } else {
                    warn!(node_id = %child, "Node revisited during traversal, tree is corrupt");
                }
            }
        }

        Ok(out)
    }

    async fn insert(conn: &mut SqliteConnection, node: &Node) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO nodes (id, room_id, parent_id, node_type, name, name_lower, \
             created_at, updated_at, size, mime, blob_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(node.id)
        .bind(node.room_id)
        .bind(node.parent_id)
        .bind(node.node_type)
        .bind(&node.name)
        .bind(&node.name_lower)
        .bind(node.created_at)
        .bind(node.updated_at)
        .bind(node.size)
        .bind(&node.mime)
        .bind(node.blob_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
