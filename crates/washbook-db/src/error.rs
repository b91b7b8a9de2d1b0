//! Database-specific error types and conversions.

use washbook_core::error::WashbookError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A unique-index violation, reported upward as a 409.
    #[error("Duplicate record: {entity}")]
    Duplicate { entity: String },
}

impl From<DbError> for WashbookError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => WashbookError::NotFound { entity, id },
            DbError::Duplicate { entity } => WashbookError::AlreadyExists { entity },
            other => WashbookError::Database(other.to_string()),
        }
    }
}
