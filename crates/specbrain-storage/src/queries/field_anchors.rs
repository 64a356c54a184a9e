//! Queries for the field_anchors table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use specbrain_core::errors::StorageError;

use super::timestamp_column;
use crate::{format_timestamp, to_storage_err};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAnchorRow {
    pub id: i64,
    pub field: String,
    pub category: String,
    pub phrase: String,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn upsert_at(
    conn: &Connection,
    field: &str,
    category: &str,
    phrase: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let ts = format_timestamp(now);
    conn.prepare_cached(
        "INSERT INTO field_anchors (field, category, phrase, usage_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, 1, ?4, ?4)
         ON CONFLICT(field, category, phrase) DO UPDATE SET
           usage_count = usage_count + 1,
           updated_at = excluded.updated_at",
    )
    .and_then(|mut stmt| stmt.execute(params![field, category, phrase, ts]))
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn query(
    conn: &Connection,
    field: &str,
    category: &str,
) -> Result<Vec<FieldAnchorRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, field, category, phrase, usage_count, created_at, updated_at
             FROM field_anchors WHERE field = ?1 AND category = ?2
             ORDER BY usage_count DESC, phrase ASC",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![field, category], map_row)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<FieldAnchorRow> {
    Ok(FieldAnchorRow {
        id: row.get(0)?,
        field: row.get(1)?,
        category: row.get(2)?,
        phrase: row.get(3)?,
        usage_count: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}
