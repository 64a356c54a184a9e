//! PRAGMA configuration applied to every SQLite connection.

use rusqlite::Connection;
use specbrain_core::errors::StorageError;

use crate::to_storage_err;

/// WAL mode, NORMAL sync, 5s busy timeout. Applied to the writer.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -16000;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(to_storage_err)
}

/// Read connections only need the busy timeout and a query-only guard.
pub fn apply_read_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA busy_timeout = 5000;
        PRAGMA query_only = ON;
        ",
    )
    .map_err(to_storage_err)
}
