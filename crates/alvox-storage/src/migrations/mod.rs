//! Schema migrations using PRAGMA user_version.

pub mod v001_initial;
pub mod v002_round_index;

use alvox_core::errors::StorageError;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current = current_version(conn).map_err(|e| StorageError::MigrationFailed {
        version: 0,
        message: e.to_string(),
    })?;

    let migrations: &[(&str, u32)] = &[
        (v001_initial::MIGRATION_SQL, 1),
        (v002_round_index::MIGRATION_SQL, 2),
    ];

    for &(sql, version) in migrations {
        if current >= version {
            continue;
        }
        conn.execute_batch(sql)
            .map_err(|e| StorageError::MigrationFailed {
                version,
                message: e.to_string(),
            })?;
        conn.pragma_update(None, "user_version", version)
            .map_err(|e| StorageError::MigrationFailed {
                version,
                message: e.to_string(),
            })?;
        tracing::info!(version, "applied migration");
    }

    Ok(())
}

/// Current schema version.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })
}

/// Version the schema reaches after `run_migrations`.
pub const LATEST_VERSION: u32 = 2;
