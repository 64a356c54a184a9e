//! Queries for the component_lexicon table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use specbrain_core::errors::StorageError;

use super::timestamp_column;
use crate::{format_timestamp, to_storage_err};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLexiconRow {
    pub id: i64,
    pub field: String,
    pub category: String,
    pub value: String,
    pub canonical: String,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert a component value, or bump its usage count and touch `updated_at`.
/// A non-empty `canonical` replaces the stored one.
pub fn upsert_at(
    conn: &Connection,
    field: &str,
    category: &str,
    value: &str,
    canonical: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let ts = format_timestamp(now);
    conn.prepare_cached(
        "INSERT INTO component_lexicon (field, category, value, canonical, usage_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
         ON CONFLICT(field, category, value) DO UPDATE SET
           usage_count = usage_count + 1,
           canonical = CASE WHEN excluded.canonical = '' THEN canonical ELSE excluded.canonical END,
           updated_at = excluded.updated_at",
    )
    .and_then(|mut stmt| stmt.execute(params![field, category, value, canonical, ts]))
    .map_err(to_storage_err)?;
    Ok(())
}

/// Rows for a field within a category, most used first.
pub fn query(
    conn: &Connection,
    field: &str,
    category: &str,
) -> Result<Vec<ComponentLexiconRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, field, category, value, canonical, usage_count, created_at, updated_at
             FROM component_lexicon WHERE field = ?1 AND category = ?2
             ORDER BY usage_count DESC, value ASC",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![field, category], map_row)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM component_lexicon", [], |row| row.get(0))
        .map_err(to_storage_err)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<ComponentLexiconRow> {
    Ok(ComponentLexiconRow {
        id: row.get(0)?,
        field: row.get(1)?,
        category: row.get(2)?,
        value: row.get(3)?,
        canonical: row.get(4)?,
        usage_count: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}
