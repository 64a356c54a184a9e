//! # specbrain-storage
//!
//! SQLite persistence for the learning core: a serialized writer plus a
//! round-robin read pool, versioned migrations, the four decay-aware memory
//! tables, and the artifact stores (SQLite rows or JSON documents).

pub mod artifacts;
pub mod connection;
pub mod decay;
pub mod memory;
pub mod migrations;
pub mod queries;

pub use artifacts::{ArtifactStore, JsonArtifactStore, SqliteArtifactStore};
pub use connection::DatabaseManager;
pub use decay::{DecayStatus, Decayed};
pub use memory::{InMemoryMemoryStore, MemoryStore, SqliteMemoryStore};

use specbrain_core::errors::StorageError;

/// Map any displayable driver error into a `StorageError`.
pub(crate) fn to_storage_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::sqlite(e.to_string())
}

/// Timestamp format shared with the SQL column defaults.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub(crate) fn format_timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
