//! Database migration management for the PostgreSQL storage backend.
//!
//! This module uses embedded migrations for single-binary deployment.

use std::borrow::Cow;

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use tracing::{info, instrument};

use crate::{PgPool, StorageError, StorageResult};

/// Macro to define embedded migrations at compile time.
///
/// Usage: Add new migrations here in chronological order.
/// Each migration is a tuple of (version, description, sql_path)
macro_rules! embedded_migrations {
    () => {
        &[(
            20260801000001i64,
            "initial_schema",
            include_str!("../../migrations/20260801000001_initial_schema.sql"),
        )]
    };
}

/// Builds a vector of Migration structs from embedded migration data.
fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]), // Empty checksum for embedded migrations
            no_tx: false,                 // Run in transaction
        })
        .collect()
}

/// Runs all pending database migrations using embedded migrations.
///
/// Migrations are embedded in the binary at compile time with
/// `include_str!()` and tracked in the `_sqlx_migrations` table, so startup
/// needs no CLI or filesystem access.
///
/// To add a new migration:
/// 1. Create the SQL file in the migrations/ directory
/// 2. Add an entry to the embedded_migrations!() macro above
///
/// # Errors
///
/// Returns an error if a migration fails to execute.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> StorageResult<()> {
    let migrations = build_migrations();
    info!("Running {} embedded migration(s)", migrations.len());

    let migrator = Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| StorageError::Migration(format!("Migration failed: {e}")))?;

    info!("Database migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_well_formed() {
        let migrations = build_migrations();
        assert!(!migrations.is_empty());

        // Versions must be strictly increasing for the migrator.
        for pair in migrations.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }

        for migration in &migrations {
            assert!(!migration.sql.trim().is_empty());
        }
    }
}
