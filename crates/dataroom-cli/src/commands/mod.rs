//! CLI command definitions and dispatch.

pub mod migrate;
pub mod node;
pub mod room;

use clap::{Parser, Subcommand};

use dataroom_core::config::AppConfig;
use dataroom_core::error::AppError;
use dataroom_database::DatabasePool;
use dataroom_database::migration::run_migrations;

use crate::output::OutputFormat;

/// DataRoom: rooms of folders and PDF documents in a local database
#[derive(Debug, Parser)]
#[command(name = "dataroom", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from config/<ENV>.toml
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Room management
    Room(room::RoomArgs),
    /// Folder and file management inside a room
    Node(node::NodeArgs),
}

impl Cli {
    /// Load configuration for this invocation.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, self.env.as_deref())
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config, self.format).await,
            Commands::Room(args) => room::execute(args, config, self.format).await,
            Commands::Node(args) => node::execute(args, config, self.format).await,
        }
    }
}

/// Helper: open the configured database with the schema up to date.
pub async fn open_db(config: &AppConfig) -> Result<DatabasePool, AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;
    Ok(db)
}
