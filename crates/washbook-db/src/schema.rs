//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

/// Unique index guarding principal emails. SurrealDB reports a
/// violation only through the error message, so the store matches on
/// this name; keep it in sync with the DDL below.
pub(crate) const PRINCIPAL_EMAIL_INDEX: &str = "idx_principal_email";

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Principals — every account that can authenticate
-- =======================================================================
DEFINE TABLE principal SCHEMAFULL;
DEFINE FIELD preferred_name ON TABLE principal TYPE string;
DEFINE FIELD email ON TABLE principal TYPE string;
DEFINE FIELD phone ON TABLE principal TYPE option<string>;
DEFINE FIELD address ON TABLE principal TYPE option<string>;
DEFINE FIELD social_media_handles ON TABLE principal TYPE array \
    DEFAULT [];
DEFINE FIELD social_media_handles.* ON TABLE principal TYPE string;
DEFINE FIELD provider ON TABLE principal TYPE string \
    ASSERT $value IN ['local', 'google', 'facebook'];
DEFINE FIELD role ON TABLE principal TYPE string \
    ASSERT $value IN ['user', 'admin'] DEFAULT 'user';
DEFINE FIELD password_hash ON TABLE principal TYPE option<string>;
DEFINE FIELD password_changed_at ON TABLE principal \
    TYPE option<datetime>;
DEFINE FIELD password_reset_digest ON TABLE principal \
    TYPE option<string>;
DEFINE FIELD password_reset_expires_at ON TABLE principal \
    TYPE option<datetime>;
DEFINE FIELD social_login_id ON TABLE principal TYPE option<string>;
DEFINE FIELD active ON TABLE principal TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_principal_email ON TABLE principal \
    COLUMNS email UNIQUE;
DEFINE INDEX idx_principal_reset_digest ON TABLE principal \
    COLUMNS password_reset_digest;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "migration applied");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_covers_the_principal_table() {
        assert!(SCHEMA_V1.contains("DEFINE TABLE principal SCHEMAFULL"));
    }

    #[test]
    fn email_index_name_matches_the_ddl() {
        assert!(SCHEMA_V1.contains(&format!(
            "DEFINE INDEX {PRINCIPAL_EMAIL_INDEX} ON TABLE principal"
        )));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "migrations must be in ascending version order"
            );
        }
    }
}
