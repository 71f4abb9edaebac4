//! Database migration runner.

use std::collections::HashSet;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use tracing::info;

use dataroom_core::error::{AppError, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// State of one known migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration version number.
    pub version: i64,
    /// Human-readable description from the file name.
    pub description: String,
    /// Whether the migration has been applied successfully.
    pub applied: bool,
}

/// Run all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    info!("Running database migrations...");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// Report which embedded migrations have been applied to `pool`.
pub async fn migration_status(pool: &SqlitePool) -> Result<Vec<MigrationStatus>, AppError> {
    let storage = |e: sqlx::Error| {
        AppError::with_source(ErrorKind::Storage, "Failed to read migration status", e)
    };

    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await
    .map_err(storage)?;

    let applied: HashSet<i64> = if tracked > 0 {
        sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await
            .map_err(storage)?
            .into_iter()
            .collect()
    } else {
        HashSet::new()
    };

    Ok(MIGRATOR
        .iter()
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}
