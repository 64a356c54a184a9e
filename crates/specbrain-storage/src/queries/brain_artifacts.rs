//! Queries for the brain_artifacts table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use specbrain_core::errors::StorageError;

use crate::{format_timestamp, to_storage_err};

/// Insert or replace the payload of (category, kind).
pub fn upsert_at(
    conn: &Connection,
    category: &str,
    kind: &str,
    version: u32,
    payload: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO brain_artifacts (category, kind, version, payload, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(category, kind) DO UPDATE SET
           version = excluded.version,
           payload = excluded.payload,
           updated_at = excluded.updated_at",
        params![category, kind, version, payload, format_timestamp(now)],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Stored payload of (category, kind), if any.
pub fn get(conn: &Connection, category: &str, kind: &str) -> Result<Option<String>, StorageError> {
    conn.query_row(
        "SELECT payload FROM brain_artifacts WHERE category = ?1 AND kind = ?2",
        params![category, kind],
        |row| row.get(0),
    )
    .optional()
    .map_err(to_storage_err)
}

/// Artifact kinds stored for a category.
pub fn kinds(conn: &Connection, category: &str) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT kind FROM brain_artifacts WHERE category = ?1 ORDER BY kind")
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![category], |row| row.get(0))
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}
