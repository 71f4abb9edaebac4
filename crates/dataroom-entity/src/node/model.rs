//! Node entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataroom_core::types::{BlobId, Millis, NodeId, RoomId};

/// Whether a node is a folder or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A container for other nodes.
    Folder,
    /// A stored PDF document.
    File,
}

impl NodeType {
    /// The lowercase storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A folder or file within a room.
///
/// `name_lower` always equals `name.to_lowercase()`; it is only ever set by
/// the constructors and [`Node::set_name`]. File nodes carry `size`, `mime`
/// and `blob_id`; folders carry none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique node identifier.
    pub id: NodeId,
    /// Owning room.
    pub room_id: RoomId,
    /// Parent folder (None for top-level nodes).
    pub parent_id: Option<NodeId>,
    /// Folder or file.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Display name.
    pub name: String,
    /// Lowercase cache of `name` for case-insensitive comparison.
    pub name_lower: String,
    /// When the node was created (ms since epoch).
    pub created_at: Millis,
    /// When the node was last renamed (ms since epoch).
    pub updated_at: Millis,
    /// File size in bytes.
    pub size: Option<i64>,
    /// File media type.
    pub mime: Option<String>,
    /// Payload reference in the blob store.
    pub blob_id: Option<BlobId>,
}

impl Node {
    /// Build a new folder record stamped with `now`.
    pub fn new_folder(
        room_id: RoomId,
        parent_id: Option<NodeId>,
        name: impl Into<String>,
        now: Millis,
    ) -> Self {
        let name = name.into();
        Self {
            id: NodeId::new(),
            room_id,
            parent_id,
            node_type: NodeType::Folder,
            name_lower: name.to_lowercase(),
            name,
            created_at: now,
            updated_at: now,
            size: None,
            mime: None,
            blob_id: None,
        }
    }

    /// Build a new file record referencing `blob_id`, stamped with `now`.
    pub fn new_file(
        room_id: RoomId,
        parent_id: Option<NodeId>,
        name: impl Into<String>,
        size: i64,
        mime: impl Into<String>,
        blob_id: BlobId,
        now: Millis,
    ) -> Self {
        let name = name.into();
        Self {
            id: NodeId::new(),
            room_id,
            parent_id,
            node_type: NodeType::File,
            name_lower: name.to_lowercase(),
            name,
            created_at: now,
            updated_at: now,
            size: Some(size),
            mime: Some(mime.into()),
            blob_id: Some(blob_id),
        }
    }

    /// Replace the name, recomputing `name_lower` and bumping `updated_at`.
    pub fn set_name(&mut self, name: impl Into<String>, now: Millis) {
        self.name = name.into();
        self.name_lower = self.name.to_lowercase();
        self.updated_at = now;
    }

    /// Check if this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.node_type == NodeType::Folder
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }
}
