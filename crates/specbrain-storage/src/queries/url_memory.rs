//! Queries for the url_memory table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use specbrain_core::errors::StorageError;

use super::timestamp_column;
use crate::{format_timestamp, to_storage_err};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlMemoryRow {
    pub id: i64,
    pub field: String,
    pub category: String,
    pub url: String,
    pub root_domain: String,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn upsert_at(
    conn: &Connection,
    field: &str,
    category: &str,
    url: &str,
    root_domain: &str,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let ts = format_timestamp(now);
    conn.prepare_cached(
        "INSERT INTO url_memory (field, category, url, root_domain, usage_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
         ON CONFLICT(field, category, url) DO UPDATE SET
           usage_count = usage_count + 1,
           updated_at = excluded.updated_at",
    )
    .and_then(|mut stmt| stmt.execute(params![field, category, url, root_domain, ts]))
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn query(
    conn: &Connection,
    field: &str,
    category: &str,
) -> Result<Vec<UrlMemoryRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, field, category, url, root_domain, usage_count, created_at, updated_at
             FROM url_memory WHERE field = ?1 AND category = ?2
             ORDER BY usage_count DESC, url ASC",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![field, category], map_row)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<UrlMemoryRow> {
    Ok(UrlMemoryRow {
        id: row.get(0)?,
        field: row.get(1)?,
        category: row.get(2)?,
        url: row.get(3)?,
        root_domain: row.get(4)?,
        usage_count: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}
