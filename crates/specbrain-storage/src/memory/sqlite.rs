//! SQLite-backed memory store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use specbrain_core::config::DecayConfig;
use specbrain_core::errors::StorageError;

use super::{
    ComponentLexiconMemory, ComponentLexiconRow, DecayAware, DomainFieldYieldRow,
    DomainYieldMemory, DomainYieldSummary, FieldAnchorMemory, FieldAnchorRow, MemoryStore,
    UrlMemory, UrlMemoryRow,
};
use crate::connection::DatabaseManager;
use crate::queries::{component_lexicon, domain_field_yield, field_anchors, url_memory};

pub struct SqliteMemoryStore {
    db: Arc<DatabaseManager>,
    decay: DecayConfig,
}

impl SqliteMemoryStore {
    pub fn new(db: Arc<DatabaseManager>, decay: DecayConfig) -> Self {
        Self { db, decay }
    }

    pub fn database(&self) -> &Arc<DatabaseManager> {
        &self.db
    }
}

impl DecayAware for SqliteMemoryStore {
    fn decay_config(&self) -> &DecayConfig {
        &self.decay
    }
}

impl ComponentLexiconMemory for SqliteMemoryStore {
    fn upsert_component_at(
        &self,
        field: &str,
        category: &str,
        value: &str,
        canonical: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db.with_writer(|conn| {
            component_lexicon::upsert_at(conn, field, category, value, canonical, now)
        })
    }

    fn query_components(
        &self,
        field: &str,
        category: &str,
    ) -> Result<Vec<ComponentLexiconRow>, StorageError> {
        self.db
            .with_reader(|conn| component_lexicon::query(conn, field, category))
    }
}

impl FieldAnchorMemory for SqliteMemoryStore {
    fn upsert_anchor_at(
        &self,
        field: &str,
        category: &str,
        phrase: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db
            .with_writer(|conn| field_anchors::upsert_at(conn, field, category, phrase, now))
    }

    fn query_anchors(&self, field: &str, category: &str) -> Result<Vec<FieldAnchorRow>, StorageError> {
        self.db
            .with_reader(|conn| field_anchors::query(conn, field, category))
    }
}

impl UrlMemory for SqliteMemoryStore {
    fn upsert_url_at(
        &self,
        field: &str,
        category: &str,
        url: &str,
        root_domain: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db.with_writer(|conn| {
            url_memory::upsert_at(conn, field, category, url, root_domain, now)
        })
    }

    fn query_urls(&self, field: &str, category: &str) -> Result<Vec<UrlMemoryRow>, StorageError> {
        self.db
            .with_reader(|conn| url_memory::query(conn, field, category))
    }
}

impl DomainYieldMemory for SqliteMemoryStore {
    fn record_yield_at(
        &self,
        domain: &str,
        field: &str,
        category: &str,
        seen_delta: i64,
        used_delta: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.db.with_writer(|conn| {
            domain_field_yield::upsert_at(conn, domain, field, category, seen_delta, used_delta, now)
        })
    }

    fn query_yield(
        &self,
        field: &str,
        category: &str,
    ) -> Result<Vec<DomainFieldYieldRow>, StorageError> {
        self.db
            .with_reader(|conn| domain_field_yield::query(conn, field, category))
    }

    fn low_yield_domains(
        &self,
        category: &str,
        min_seen: i64,
        max_yield: f64,
    ) -> Result<Vec<DomainYieldSummary>, StorageError> {
        self.db.with_reader(|conn| {
            domain_field_yield::low_yield_domains(conn, category, min_seen, max_yield)
        })
    }
}

impl MemoryStore for SqliteMemoryStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
