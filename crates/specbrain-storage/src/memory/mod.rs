//! Decay-aware memory tables behind narrow per-table traits.
//!
//! Each table supports an increment-on-conflict upsert, an exact
//! (field, category) lookup, and a lookup annotated with decay status.
//! `MemoryStore` bundles the four so callers can hold one trait object.

pub mod in_memory;
pub mod sqlite;

use chrono::{DateTime, Utc};
use specbrain_core::config::DecayConfig;
use specbrain_core::errors::StorageError;

pub use in_memory::InMemoryMemoryStore;
pub use sqlite::SqliteMemoryStore;

pub use crate::queries::component_lexicon::ComponentLexiconRow;
pub use crate::queries::domain_field_yield::{DomainFieldYieldRow, DomainYieldSummary};
pub use crate::queries::field_anchors::FieldAnchorRow;
pub use crate::queries::url_memory::UrlMemoryRow;

use crate::decay::{annotate, Decayed};

/// Access to the decay windows a store classifies with.
pub trait DecayAware {
    fn decay_config(&self) -> &DecayConfig;
}

pub trait ComponentLexiconMemory: DecayAware {
    fn upsert_component_at(
        &self,
        field: &str,
        category: &str,
        value: &str,
        canonical: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    fn query_components(
        &self,
        field: &str,
        category: &str,
    ) -> Result<Vec<ComponentLexiconRow>, StorageError>;

    fn upsert_component(
        &self,
        field: &str,
        category: &str,
        value: &str,
        canonical: &str,
    ) -> Result<(), StorageError> {
        self.upsert_component_at(field, category, value, canonical, Utc::now())
    }

    fn query_components_with_decay(
        &self,
        field: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Decayed<ComponentLexiconRow>>, StorageError> {
        let window = self.decay_config().effective_component_lexicon();
        Ok(self
            .query_components(field, category)?
            .into_iter()
            .map(|row| {
                let updated = row.updated_at;
                annotate(row, updated, now, window)
            })
            .collect())
    }
}

pub trait FieldAnchorMemory: DecayAware {
    fn upsert_anchor_at(
        &self,
        field: &str,
        category: &str,
        phrase: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    fn query_anchors(&self, field: &str, category: &str) -> Result<Vec<FieldAnchorRow>, StorageError>;

    fn upsert_anchor(&self, field: &str, category: &str, phrase: &str) -> Result<(), StorageError> {
        self.upsert_anchor_at(field, category, phrase, Utc::now())
    }

    fn query_anchors_with_decay(
        &self,
        field: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Decayed<FieldAnchorRow>>, StorageError> {
        let window = self.decay_config().effective_field_anchors();
        Ok(self
            .query_anchors(field, category)?
            .into_iter()
            .map(|row| {
                let updated = row.updated_at;
                annotate(row, updated, now, window)
            })
            .collect())
    }
}

pub trait UrlMemory: DecayAware {
    fn upsert_url_at(
        &self,
        field: &str,
        category: &str,
        url: &str,
        root_domain: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    fn query_urls(&self, field: &str, category: &str) -> Result<Vec<UrlMemoryRow>, StorageError>;

    fn upsert_url(
        &self,
        field: &str,
        category: &str,
        url: &str,
        root_domain: &str,
    ) -> Result<(), StorageError> {
        self.upsert_url_at(field, category, url, root_domain, Utc::now())
    }

    fn query_urls_with_decay(
        &self,
        field: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Decayed<UrlMemoryRow>>, StorageError> {
        let window = self.decay_config().effective_url_memory();
        Ok(self
            .query_urls(field, category)?
            .into_iter()
            .map(|row| {
                let updated = row.updated_at;
                annotate(row, updated, now, window)
            })
            .collect())
    }
}

pub trait DomainYieldMemory: DecayAware {
    fn record_yield_at(
        &self,
        domain: &str,
        field: &str,
        category: &str,
        seen_delta: i64,
        used_delta: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    fn query_yield(
        &self,
        field: &str,
        category: &str,
    ) -> Result<Vec<DomainFieldYieldRow>, StorageError>;

    fn low_yield_domains(
        &self,
        category: &str,
        min_seen: i64,
        max_yield: f64,
    ) -> Result<Vec<DomainYieldSummary>, StorageError>;

    fn record_yield(
        &self,
        domain: &str,
        field: &str,
        category: &str,
        seen_delta: i64,
        used_delta: i64,
    ) -> Result<(), StorageError> {
        self.record_yield_at(domain, field, category, seen_delta, used_delta, Utc::now())
    }

    fn query_yield_with_decay(
        &self,
        field: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Decayed<DomainFieldYieldRow>>, StorageError> {
        let window = self.decay_config().effective_domain_field_yield();
        Ok(self
            .query_yield(field, category)?
            .into_iter()
            .map(|row| {
                let updated = row.updated_at;
                annotate(row, updated, now, window)
            })
            .collect())
    }
}

/// All four memory tables behind one object.
pub trait MemoryStore:
    ComponentLexiconMemory + FieldAnchorMemory + UrlMemory + DomainYieldMemory + Send + Sync
{
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
