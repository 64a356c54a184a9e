//! Queries for the domain_field_yield table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use specbrain_core::errors::StorageError;

use super::timestamp_column;
use crate::{format_timestamp, to_storage_err};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainFieldYieldRow {
    pub id: i64,
    pub domain: String,
    pub field: String,
    pub category: String,
    pub seen_count: i64,
    pub used_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DomainFieldYieldRow {
    pub fn yield_ratio(&self) -> f64 {
        yield_ratio(self.seen_count, self.used_count)
    }
}

/// Per-domain totals across every field of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainYieldSummary {
    pub domain: String,
    pub seen_count: i64,
    pub used_count: i64,
    pub yield_ratio: f64,
}

/// `used / seen`, 0 when nothing was seen.
pub fn yield_ratio(seen: i64, used: i64) -> f64 {
    if seen <= 0 {
        0.0
    } else {
        used as f64 / seen as f64
    }
}

/// Add `seen_delta` / `used_delta` to the counters of (domain, field, category).
pub fn upsert_at(
    conn: &Connection,
    domain: &str,
    field: &str,
    category: &str,
    seen_delta: i64,
    used_delta: i64,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let ts = format_timestamp(now);
    conn.prepare_cached(
        "INSERT INTO domain_field_yield (domain, field, category, seen_count, used_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(domain, field, category) DO UPDATE SET
           seen_count = seen_count + excluded.seen_count,
           used_count = used_count + excluded.used_count,
           updated_at = excluded.updated_at",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            domain,
            field,
            category,
            seen_delta.max(0),
            used_delta.max(0),
            ts
        ])
    })
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn query(
    conn: &Connection,
    field: &str,
    category: &str,
) -> Result<Vec<DomainFieldYieldRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, domain, field, category, seen_count, used_count, created_at, updated_at
             FROM domain_field_yield WHERE field = ?1 AND category = ?2
             ORDER BY used_count DESC, seen_count DESC, domain ASC",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![field, category], map_row)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Domains with at least `min_seen` sightings whose overall yield is at most `max_yield`.
/// Lowest yield first.
pub fn low_yield_domains(
    conn: &Connection,
    category: &str,
    min_seen: i64,
    max_yield: f64,
) -> Result<Vec<DomainYieldSummary>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT domain, SUM(seen_count) AS seen, SUM(used_count) AS used
             FROM domain_field_yield WHERE category = ?1
             GROUP BY domain
             HAVING SUM(seen_count) >= ?2
             ORDER BY domain ASC",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![category, min_seen], |row| {
            let seen: i64 = row.get(1)?;
            let used: i64 = row.get(2)?;
            Ok(DomainYieldSummary {
                domain: row.get(0)?,
                seen_count: seen,
                used_count: used,
                yield_ratio: yield_ratio(seen, used),
            })
        })
        .map_err(to_storage_err)?;
    let mut out = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_storage_err)?;
    out.retain(|s| s.yield_ratio <= max_yield);
    sort_low_yield(&mut out);
    Ok(out)
}

/// Lowest yield first, then most seen, then domain.
pub fn sort_low_yield(rows: &mut [DomainYieldSummary]) {
    rows.sort_by(|a, b| {
        a.yield_ratio
            .total_cmp(&b.yield_ratio)
            .then_with(|| b.seen_count.cmp(&a.seen_count))
            .then_with(|| a.domain.cmp(&b.domain))
    });
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<DomainFieldYieldRow> {
    Ok(DomainFieldYieldRow {
        id: row.get(0)?,
        domain: row.get(1)?,
        field: row.get(2)?,
        category: row.get(3)?,
        seen_count: row.get(4)?,
        used_count: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}
