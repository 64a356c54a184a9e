//! Query modules, one per table.

pub mod brain_artifacts;
pub mod component_lexicon;
pub mod domain_field_yield;
pub mod field_anchors;
pub mod url_memory;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

/// Read an ISO-8601 timestamp column.
pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
