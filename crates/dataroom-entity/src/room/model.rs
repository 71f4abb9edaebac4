//! Room entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dataroom_core::types::{Millis, RoomId};

/// A top-level namespace that owns one tree of folders and files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique room identifier.
    pub id: RoomId,
    /// Display name, stored trimmed.
    pub name: String,
    /// When the room was created (ms since epoch).
    pub created_at: Millis,
    /// When the room was last renamed (ms since epoch).
    pub updated_at: Millis,
}
