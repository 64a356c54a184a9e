//! Artifact store backed by the `brain_artifacts` table.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use specbrain_core::errors::{ArtifactError, BrainResult};

use super::{document_version, ArtifactStore};
use crate::connection::DatabaseManager;
use crate::queries::brain_artifacts;

pub struct SqliteArtifactStore {
    db: Arc<DatabaseManager>,
}

impl SqliteArtifactStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Artifact kinds persisted for a category.
    pub fn kinds(&self, category: &str) -> BrainResult<Vec<String>> {
        Ok(self
            .db
            .with_reader(|conn| brain_artifacts::kinds(conn, category))?)
    }
}

impl ArtifactStore for SqliteArtifactStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn load(&self, category: &str, kind: &str) -> BrainResult<Option<Value>> {
        let payload = self
            .db
            .with_reader(|conn| brain_artifacts::get(conn, category, kind))?;
        match payload {
            None => Ok(None),
            Some(text) => {
                let value = serde_json::from_str(&text).map_err(|e| ArtifactError::Parse {
                    kind: kind.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Some(value))
            }
        }
    }

    fn save(&self, category: &str, kind: &str, document: &Value) -> BrainResult<()> {
        let payload = serde_json::to_string(document).map_err(|e| ArtifactError::Serialize {
            kind: kind.to_string(),
            message: e.to_string(),
        })?;
        let version = document_version(document);
        self.db.with_writer(|conn| {
            brain_artifacts::upsert_at(conn, category, kind, version, &payload, Utc::now())
        })?;
        Ok(())
    }
}
