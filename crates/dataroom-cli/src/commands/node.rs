//! Folder and file management CLI commands.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_core::types::{NodeId, RoomId};
use dataroom_database::{NodeRepository, RoomRepository};
use dataroom_entity::node::{NewFile, Node, PDF_MIME};

use crate::output::{self, OutputFormat};

/// Arguments for node commands
#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Node subcommand
    #[command(subcommand)]
    pub command: NodeCommand,
}

/// Node subcommands
#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// List the contents of a folder (folders first, then by name)
    Ls {
        /// Room ID
        #[arg(short, long)]
        room: String,
        /// Parent folder ID (omit for the room's top level)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Create a folder
    Mkdir {
        /// Room ID
        #[arg(short, long)]
        room: String,
        /// Parent folder ID (omit for the room's top level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Folder name
        name: String,
    },
    /// Upload a PDF from the local filesystem
    Upload {
        /// Room ID
        #[arg(short, long)]
        room: String,
        /// Parent folder ID (omit for the room's top level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Name to store the file under (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Media type (inferred from the extension when omitted)
        #[arg(short, long)]
        mime: Option<String>,
        /// Local file to upload
        path: PathBuf,
    },
    /// Rename a folder or file
    Rename {
        /// Node ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a folder or file and everything beneath it
    Rm {
        /// Node ID
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Find a folder by its slash-separated path (case-insensitive)
    Resolve {
        /// Room ID
        #[arg(short, long)]
        room: String,
        /// Folder path, e.g. "Legal/Contracts"
        path: String,
    },
    /// Show the folder tree of a room
    Tree {
        /// Room ID
        #[arg(short, long)]
        room: String,
        /// Start folder ID (omit for the whole room)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Write a stored PDF to the local filesystem
    Export {
        /// File node ID
        id: String,
        /// Output path (defaults to the stored name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite the output file if it already exists
        #[arg(long)]
        force: bool,
    },
    /// Show the breadcrumb path of a node
    Path {
        /// Node ID
        id: String,
    },
}

/// Node display row
#[derive(Debug, Serialize, Tabled)]
struct NodeRow {
    id: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    node_type: String,
    name: String,
    size: String,
    mime: String,
    updated_at: String,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.to_string(),
            node_type: node.node_type.to_string(),
            name: node.name.clone(),
            size: node.size.map(output::format_size).unwrap_or_else(|| "-".into()),
            mime: node.mime.clone().unwrap_or_else(|| "-".into()),
            updated_at: output::format_millis(node.updated_at),
        }
    }
}

/// Tree entry for JSON output
#[derive(Debug, Serialize)]
struct TreeEntry {
    depth: usize,
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    name: String,
}

/// Execute node commands
pub async fn execute(
    args: &NodeArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let db = super::open_db(config).await?;
    let node_repo = NodeRepository::new(db.pool().clone());
    let room_repo = RoomRepository::new(db.pool().clone());

    match &args.command {
        NodeCommand::Ls { room, parent } => {
            let room_id = RoomId::parse_arg(room)?;
            let parent_id = parse_parent(parent.as_deref())?;
            let nodes = node_repo
                .get_nodes_by_parent(Some(room_id), parent_id)
                .await?;
            let rows: Vec<NodeRow> = nodes.iter().map(NodeRow::from).collect();
            output::print_list(&rows, format);
        }
        NodeCommand::Mkdir { room, parent, name } => {
            let room_id = RoomId::parse_arg(room)?;
            let parent_id = parse_parent(parent.as_deref())?;
            let folder = node_repo.create_folder(room_id, parent_id, name).await?;
            print_created(&folder, "Folder", format);
        }
        NodeCommand::Upload {
            room,
            parent,
            name,
            mime,
            path,
        } => {
            let room_id = RoomId::parse_arg(room)?;
            let parent_id = parse_parent(parent.as_deref())?;
            let file = read_upload(
                path,
                name.as_deref(),
                mime.as_deref(),
                config.storage.max_upload_size_bytes,
            )
            .await?;

            let id = node_repo.create_file(room_id, parent_id, file).await?;
            let node = node_repo
                .get_node(id)
                .await?
                .ok_or_else(|| AppError::internal(format!("Uploaded node {id} vanished")))?;
            print_created(&node, "File", format);
        }
        NodeCommand::Rename { id, name } => {
            let node_id = NodeId::parse_arg(id)?;
            require_node(&node_repo, node_id).await?;
            node_repo.rename_node(node_id, name).await?;
            let node = require_node(&node_repo, node_id).await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!("Renamed {node_id} to '{}'", node.name))
                }
                OutputFormat::Json => output::print_item(&NodeRow::from(&node), format),
            }
        }
        NodeCommand::Rm { id, yes } => {
            let node_id = NodeId::parse_arg(id)?;
            let node = require_node(&node_repo, node_id).await?;
            let count = node_repo.collect_descendants_bfs(node_id).await?.len();

            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Delete {} '{}' ({count} items in total)?",
                        node.node_type, node.name
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            node_repo.delete_cascade(node_id).await?;
            output::print_success(&format!("Deleted '{}' ({count} items)", node.name));
        }
        NodeCommand::Resolve { room, path } => {
            let room_id = RoomId::parse_arg(room)?;
            let segments = split_path(path);
            let node = node_repo
                .resolve_path(room_id, &segments)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Folder '{path}' not found")))?;
            output::print_item(&NodeRow::from(&node), format);
        }
        NodeCommand::Tree { room, parent } => {
            let room_id = RoomId::parse_arg(room)?;
            let parent_id = parse_parent(parent.as_deref())?;
            let room = room_repo
                .get_room(room_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;
            let entries = walk_tree(&node_repo, room_id, parent_id).await?;

            match format {
                OutputFormat::Table => {
                    println!("{}/", room.name);
                    for (node, depth) in &entries {
                        let indent = "│   ".repeat(*depth);
                        if node.is_folder() {
                            println!("{indent}├── {}/", node.name);
                        } else {
                            let size = output::format_size(node.size.unwrap_or_default());
                            println!("{indent}├── {} ({size})", node.name);
                        }
                    }
                }
                OutputFormat::Json => {
                    let json: Vec<TreeEntry> = entries
                        .iter()
                        .map(|(node, depth)| TreeEntry {
                            depth: *depth,
                            id: node.id.to_string(),
                            node_type: node.node_type.to_string(),
                            name: node.name.clone(),
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
            }
        }
        NodeCommand::Export {
            id,
            output: out,
            force,
        } => {
            let node_id = NodeId::parse_arg(id)?;
            let (node, data) = node_repo
                .read_file(node_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("File {node_id} not found")))?;
            let target = export_target(out.as_deref(), &node.name, *force).await?;

            tokio::fs::write(&target, &data).await?;
            output::print_success(&format!(
                "Exported '{}' to {} ({})",
                node.name,
                target.display(),
                output::format_size(data.len() as i64)
            ));
        }
        NodeCommand::Path { id } => {
            let node_id = NodeId::parse_arg(id)?;
            let trail = node_repo.ancestors(node_id).await?;
            if trail.is_empty() {
                return Err(AppError::not_found(format!("Node {node_id} not found")));
            }
            match format {
                OutputFormat::Table => println!("{}", breadcrumbs(&trail)),
                OutputFormat::Json => {
                    let rows: Vec<NodeRow> = trail.iter().map(NodeRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
    }

    db.close().await;
    Ok(())
}

fn parse_parent(parent: Option<&str>) -> Result<Option<NodeId>, AppError> {
    parent.map(NodeId::parse_arg).transpose()
}

async fn require_node(repo: &NodeRepository, id: NodeId) -> Result<Node, AppError> {
    repo.get_node(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
}

fn print_created(node: &Node, label: &str, format: OutputFormat) {
    match format {
        OutputFormat::Table => output::print_success(&format!(
            "{label} '{}' created (id: {})",
            node.name, node.id
        )),
        OutputFormat::Json => output::print_item(&NodeRow::from(node), format),
    }
}

/// Read a local file into an upload payload, enforcing the size limit.
async fn read_upload(
    path: &Path,
    name: Option<&str>,
    mime: Option<&str>,
    max_size: u64,
) -> Result<NewFile, AppError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::invalid_argument(format!("Cannot read '{}': {e}", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(AppError::invalid_argument(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > max_size {
        return Err(AppError::invalid_argument(format!(
            "'{}' is {} bytes, above the upload limit of {max_size} bytes",
            path.display(),
            metadata.len()
        )));
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let mime = mime.map_or_else(|| infer_mime(path).to_string(), str::to_string);
    let data = tokio::fs::read(path).await?;

    Ok(NewFile::new(name, mime, Bytes::from(data)))
}

/// Media type for a local file, from its extension.
fn infer_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MIME,
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Where `node export` writes. Without an explicit output the stored name is
/// reduced to its final component so it stays in the current directory.
async fn export_target(
    output: Option<&Path>,
    stored_name: &str,
    force: bool,
) -> Result<PathBuf, AppError> {
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => Path::new(stored_name)
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| {
                AppError::invalid_argument(format!(
                    "Cannot derive a file name from '{stored_name}', pass --output"
                ))
            })?,
    };

    if !force && tokio::fs::try_exists(&target).await? {
        return Err(AppError::conflict(format!(
            "{} already exists, pass --force to overwrite",
            target.display()
        )));
    }
    Ok(target)
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn breadcrumbs(trail: &[Node]) -> String {
    let names: Vec<&str> = trail.iter().map(|n| n.name.as_str()).collect();
    format!("/{}", names.join("/"))
}

/// Depth-first listing of the subtree under `parent_id`, folders first.
async fn walk_tree(
    repo: &NodeRepository,
    room_id: RoomId,
    parent_id: Option<NodeId>,
) -> Result<Vec<(Node, usize)>, AppError> {
    let mut out = Vec::new();
    let mut seen: HashSet<NodeId> = parent_id.into_iter().collect();
    let mut stack: Vec<(Node, usize)> = repo
        .get_nodes_by_parent(Some(room_id), parent_id)
        .await?
        .into_iter()
        .rev()
        .map(|node| (node, 0))
        .collect();

    while let Some((node, depth)) = stack.pop() {
        if !seen.insert(node.id) {
            warn!(node_id = %node.id, "Node revisited while walking tree, skipping");
            continue;
        }
        if node.is_folder() {
            let children = repo.get_nodes_by_parent(Some(room_id), Some(node.id)).await?;
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
        out.push((node, depth));
    }

    Ok(out)
}
