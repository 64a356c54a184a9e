//! Brain artifact persistence: one JSON document per (category, kind).

pub mod json_store;
pub mod sqlite_store;

use serde_json::Value;
use specbrain_core::errors::BrainResult;

pub use json_store::JsonArtifactStore;
pub use sqlite_store::SqliteArtifactStore;

/// Raw document storage keyed by category and artifact kind.
///
/// `load` returns `Ok(None)` when no document exists; callers substitute the
/// empty artifact.
pub trait ArtifactStore: Send + Sync {
    /// Short backend name for logs and degradation records.
    fn name(&self) -> &'static str;

    fn load(&self, category: &str, kind: &str) -> BrainResult<Option<Value>>;

    fn save(&self, category: &str, kind: &str, document: &Value) -> BrainResult<()>;
}

/// File-system safe form of a category or kind name.
pub fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_default".to_string()
    } else {
        cleaned
    }
}

/// `version` field of a document, 0 when absent.
pub(crate) fn document_version(document: &Value) -> u32 {
    document
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}
