//! Versioned schema migrations tracked through `PRAGMA user_version`.

pub mod v001_memory_tables;
pub mod v002_brain_artifacts;

use rusqlite::Connection;
use specbrain_core::errors::StorageError;

use crate::to_storage_err;

/// Ordered (version, SQL) pairs. Versions must be strictly increasing.
const MIGRATIONS: &[(u32, &str)] = &[
    (1, v001_memory_tables::MIGRATION_SQL),
    (2, v002_brain_artifacts::MIGRATION_SQL),
];

/// Latest schema version.
pub const LATEST_VERSION: u32 = 2;

/// Current schema version of a connection.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))
        .map_err(to_storage_err)
}

/// Apply every migration newer than the connection's `user_version`, each in its own transaction.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current = current_version(conn)?;
    for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
            version: *version,
            message: e.to_string(),
        };
        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", version)
            .map_err(failed)?;
        tx.commit().map_err(failed)?;
        tracing::debug!(version, "applied migration");
    }
    Ok(())
}
