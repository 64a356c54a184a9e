//! Common envelope of every persisted brain artifact.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use specbrain_core::constants::ARTIFACT_VERSION;
use specbrain_core::errors::ArtifactError;

/// `version` and `updated_at`, flattened into each artifact document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactMeta {
    pub version: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ArtifactMeta {
    fn default() -> Self {
        Self {
            version: ARTIFACT_VERSION,
            updated_at: None,
        }
    }
}

/// A document persisted once per (category, kind).
pub trait BrainArtifact: Serialize + DeserializeOwned + Default + Clone + Send + Sync {
    /// Document name, e.g. `field_lexicon`.
    const KIND: &'static str;

    fn meta(&self) -> &ArtifactMeta;

    fn meta_mut(&mut self) -> &mut ArtifactMeta;

    /// Stamp the current schema version and modification time.
    fn touch(&mut self, now: DateTime<Utc>) {
        let meta = self.meta_mut();
        meta.version = ARTIFACT_VERSION;
        meta.updated_at = Some(now);
    }
}

macro_rules! impl_brain_artifact {
    ($ty:ty, $kind:literal) => {
        impl $crate::artifact::BrainArtifact for $ty {
            const KIND: &'static str = $kind;

            fn meta(&self) -> &$crate::artifact::ArtifactMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::artifact::ArtifactMeta {
                &mut self.meta
            }
        }
    };
}
pub(crate) use impl_brain_artifact;

/// Decode a stored document. Absent or undecodable documents yield the empty artifact.
pub fn decode_artifact<A: BrainArtifact>(document: Option<Value>) -> A {
    match document {
        None | Some(Value::Null) => A::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(kind = A::KIND, error = %e, "discarding undecodable artifact");
            A::default()
        }),
    }
}

pub fn encode_artifact<A: BrainArtifact>(artifact: &A) -> Result<Value, ArtifactError> {
    serde_json::to_value(artifact).map_err(|e| ArtifactError::Serialize {
        kind: A::KIND.to_string(),
        message: e.to_string(),
    })
}

/// Keep the `cap` largest entries of a frequency map, ties broken by key.
pub(crate) fn truncate_counts(map: &mut std::collections::BTreeMap<String, u64>, cap: usize) {
    if map.len() <= cap {
        return;
    }
    let mut entries: Vec<(String, u64)> = std::mem::take(map).into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(cap);
    map.extend(entries);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn truncate_keeps_most_frequent_then_lexical() {
        let mut map: BTreeMap<String, u64> = [("b", 1), ("a", 1), ("c", 5), ("d", 2)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        truncate_counts(&mut map, 3);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c", "d"]);
    }
}
