//! Storage configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where brain artifacts are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// JSON documents only.
    Json,
    /// SQLite primary store; JSON documents are read only as a fallback.
    Sqlite,
    /// Write to both the SQLite store and the JSON documents.
    DualWrite,
}

impl PersistMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
            Self::DualWrite => "dual_write",
        }
    }

    /// Whether the structured store is consulted at all.
    pub fn uses_primary(&self) -> bool {
        matches!(self, Self::Sqlite | Self::DualWrite)
    }
}

impl fmt::Display for PersistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PersistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            "dual" | "dual_write" | "dual-write" => Ok(Self::DualWrite),
            other => Err(format!("unknown persist mode '{other}'")),
        }
    }
}

/// Configuration for artifact and memory persistence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path. Default: `specbrain.db`.
    pub db_path: Option<String>,
    /// Root directory of the JSON artifact documents. Default: `_learning`.
    pub json_root: Option<String>,
    /// Persist mode. Default: json.
    pub persist_mode: Option<PersistMode>,
    /// Number of pooled read connections. Default: 4.
    pub read_pool_size: Option<usize>,
}

impl StorageConfig {
    pub fn effective_db_path(&self) -> &str {
        self.db_path.as_deref().unwrap_or("specbrain.db")
    }

    pub fn effective_json_root(&self) -> &str {
        self.json_root.as_deref().unwrap_or("_learning")
    }

    pub fn effective_persist_mode(&self) -> PersistMode {
        self.persist_mode.unwrap_or(PersistMode::Json)
    }

    pub fn effective_read_pool_size(&self) -> usize {
        self.read_pool_size.unwrap_or(4)
    }
}
