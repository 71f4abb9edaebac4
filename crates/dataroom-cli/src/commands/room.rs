//! Room management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::types::RoomId;
use dataroom_database::{NodeRepository, RoomRepository};
use dataroom_entity::room::Room;

use crate::output::{self, OutputFormat};

/// Arguments for room commands
#[derive(Debug, Args)]
pub struct RoomArgs {
    /// Room subcommand
    #[command(subcommand)]
    pub command: RoomCommand,
}

/// Room subcommands
#[derive(Debug, Subcommand)]
pub enum RoomCommand {
    /// List all rooms, oldest first
    List,
    /// Create a new room
    Create {
        /// Room name
        name: String,
    },
    /// Rename a room
    Rename {
        /// Room ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a room with all of its folders and files
    Delete {
        /// Room ID
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Room display row
#[derive(Debug, Serialize, Tabled)]
struct RoomRow {
    id: String,
    name: String,
    nodes: u64,
    created_at: String,
    updated_at: String,
}

impl RoomRow {
    fn new(room: &Room, nodes: u64) -> Self {
        Self {
            id: room.id.to_string(),
            name: room.name.clone(),
            nodes,
            created_at: output::format_millis(room.created_at),
            updated_at: output::format_millis(room.updated_at),
        }
    }
}

/// Execute room commands
pub async fn execute(
    args: &RoomArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let db = super::open_db(config).await?;
    let room_repo = RoomRepository::new(db.pool().clone());
    let node_repo = NodeRepository::new(db.pool().clone());

    match &args.command {
        RoomCommand::List => {
            let rooms = room_repo.list_rooms().await?;
            let mut rows = Vec::with_capacity(rooms.len());
            for room in &rooms {
                rows.push(RoomRow::new(room, node_repo.count_in_room(room.id).await?));
            }
            output::print_list(&rows, format);
        }
        RoomCommand::Create { name } => {
            let room = room_repo.create_room(name).await?;
            match format {
                OutputFormat::Table => output::print_success(&format!(
                    "Room '{}' created (id: {})",
                    room.name, room.id
                )),
                OutputFormat::Json => output::print_item(&RoomRow::new(&room, 0), format),
            }
        }
        RoomCommand::Rename { id, name } => {
            let room_id = RoomId::parse_arg(id)?;
            if room_repo.rename_room(room_id, name).await? == 0 {
                return Err(AppError::not_found(format!("Room {room_id} not found")));
            }
            output::print_success(&format!("Room {room_id} renamed to '{}'", name.trim()));
        }
        RoomCommand::Delete { id, yes } => {
            let room_id = RoomId::parse_arg(id)?;
            let room = room_repo
                .get_room(room_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;
            let nodes = node_repo.count_in_room(room_id).await?;

            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Delete room '{}' and its {nodes} folders and files? This cannot be undone.",
                        room.name
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            room_repo.delete_room(room_id).await?;
            output::print_success(&format!("Room '{}' deleted ({nodes} nodes removed)", room.name));
        }
    }

    db.close().await;
    Ok(())
}
