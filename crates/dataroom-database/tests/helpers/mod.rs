//! Shared test helpers for repository integration tests.

#![allow(dead_code)]

use bytes::Bytes;

use dataroom_core::types::{NodeId, RoomId};
use dataroom_database::{BlobRepository, DatabasePool, NodeRepository, RoomRepository};
use dataroom_entity::node::{NewFile, Node};
use dataroom_entity::room::Room;

/// Test context: a private in-memory database with one room already created.
pub struct TestRoom {
    /// Database handle for direct queries.
    pub db: DatabasePool,
    /// Room repository.
    pub rooms: RoomRepository,
    /// Node repository.
    pub nodes: NodeRepository,
    /// Blob repository.
    pub blobs: BlobRepository,
    /// The room every helper writes into.
    pub room: Room,
}

impl TestRoom {
    /// Open a fresh database and create a room named "Deal Room".
    pub async fn new() -> Self {
        let db = DatabasePool::in_memory()
            .await
            .expect("Failed to open in-memory database");
        let rooms = RoomRepository::new(db.pool().clone());
        let nodes = NodeRepository::new(db.pool().clone());
        let blobs = BlobRepository::new(db.pool().clone());
        let room = rooms
            .create_room("Deal Room")
            .await
            .expect("Failed to create room");

        Self {
            db,
            rooms,
            nodes,
            blobs,
            room,
        }
    }

    /// The room id helpers write into.
    pub fn room_id(&self) -> RoomId {
        self.room.id
    }

    /// Create a folder under `parent`.
    pub async fn folder(&self, parent: Option<NodeId>, name: &str) -> Node {
        self.nodes
            .create_folder(self.room.id, parent, name)
            .await
            .expect("Failed to create folder")
    }

    /// Upload a PDF under `parent` and return the stored node.
    pub async fn pdf(&self, parent: Option<NodeId>, name: &str, body: &'static [u8]) -> Node {
        let id = self
            .nodes
            .create_file(self.room.id, parent, NewFile::pdf(name, Bytes::from_static(body)))
            .await
            .expect("Failed to create file");
        self.nodes
            .get_node(id)
            .await
            .expect("Failed to read file node")
            .expect("File node missing after create")
    }

    /// Count rows in `table`.
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count rows")
    }

    /// Install a trigger that aborts every matching statement.
    pub async fn fail_on(&self, trigger: &str, event: &str) {
        sqlx::query(&format!(
            "CREATE TRIGGER {trigger} BEFORE {event} BEGIN SELECT RAISE(ABORT, 'injected failure'); END"
        ))
        .execute(self.db.pool())
        .await
        .expect("Failed to install trigger");
    }
}

/// Sample PDF body.
pub const PDF_BODY: &[u8] = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF";
