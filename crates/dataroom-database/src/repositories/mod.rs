//! Repository implementations for all DataRoom entities.

pub mod blob;
pub mod node;
pub mod room;

pub use blob::BlobRepository;
pub use node::NodeRepository;
pub use room::RoomRepository;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use dataroom_core::error::{AppError, ErrorKind};
use dataroom_core::result::AppResult;

/// Maximum number of bound ids per `IN (...)` statement.
const ID_BATCH: usize = 500;

/// Reject a name that is empty or only whitespace.
pub(crate) fn reject_blank(name: &str, label: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_argument(format!(
            "{label} name is required and must be a non-empty string"
        )));
    }
    Ok(())
}

/// Trim `name` and reject it when nothing is left.
pub(crate) fn require_name<'a>(name: &'a str, label: &str) -> AppResult<&'a str> {
    reject_blank(name, label)?;
    Ok(name.trim())
}

/// Map a write failure, surfacing uniqueness violations as conflicts.
pub(crate) fn write_error(e: sqlx::Error, context: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::with_source(
            ErrorKind::Conflict,
            format!("{context}: a sibling with the same name already exists"),
            e,
        ),
        _ => AppError::with_source(ErrorKind::Storage, context.to_string(), e),
    }
}

/// Delete every row of `table` whose `id` is in `ids`, in batches.
pub(crate) async fn delete_by_ids(
    conn: &mut SqliteConnection,
    table: &'static str,
    ids: &[Uuid],
) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for chunk in ids.chunks(ID_BATCH) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("DELETE FROM {table} WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        affected += builder.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_name_trims() {
        assert_eq!(require_name("  Board  ", "Room").expect("valid"), "Board");
    }

    #[test]
    fn test_reject_blank_accepts_padded_names() {
        assert!(reject_blank("  Deck.pdf", "File").is_ok());
        assert_eq!(
            reject_blank("", "Folder").unwrap_err().kind,
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_require_name_rejects_blank() {
        let err = require_name(" \t ", "Room").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(
            err.message,
            "Room name is required and must be a non-empty string"
        );
    }
}
