//! In-memory memory store with the same upsert and ordering semantics as SQLite.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use specbrain_core::config::DecayConfig;
use specbrain_core::errors::StorageError;

use super::{
    ComponentLexiconMemory, ComponentLexiconRow, DecayAware, DomainFieldYieldRow,
    DomainYieldMemory, DomainYieldSummary, FieldAnchorMemory, FieldAnchorRow, MemoryStore,
    UrlMemory, UrlMemoryRow,
};
use crate::queries::domain_field_yield::{sort_low_yield, yield_ratio};

type Key = (String, String, String);

#[derive(Default)]
struct Tables {
    next_id: i64,
    components: BTreeMap<Key, ComponentLexiconRow>,
    anchors: BTreeMap<Key, FieldAnchorRow>,
    urls: BTreeMap<Key, UrlMemoryRow>,
    /// Keyed by (domain, field, category).
    yields: BTreeMap<Key, DomainFieldYieldRow>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryMemoryStore {
    tables: Mutex<Tables>,
    decay: DecayConfig,
}

impl InMemoryMemoryStore {
    pub fn new(decay: DecayConfig) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            decay,
        }
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, StorageError> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| StorageError::sqlite("memory store lock poisoned"))?;
        Ok(f(&mut guard))
    }
}

fn key(a: &str, b: &str, c: &str) -> Key {
    (a.to_string(), b.to_string(), c.to_string())
}

impl DecayAware for InMemoryMemoryStore {
    fn decay_config(&self) -> &DecayConfig {
        &self.decay
    }
}

impl ComponentLexiconMemory for InMemoryMemoryStore {
    fn upsert_component_at(
        &self,
        field: &str,
        category: &str,
        value: &str,
        canonical: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_tables(|t| {
            let k = key(field, category, value);
            if let Some(row) = t.components.get_mut(&k) {
                row.usage_count += 1;
                if !canonical.is_empty() {
                    row.canonical = canonical.to_string();
                }
                row.updated_at = now;
                return;
            }
            let id = t.next_id();
            t.components.insert(
                k,
                ComponentLexiconRow {
                    id,
                    field: field.to_string(),
                    category: category.to_string(),
                    value: value.to_string(),
                    canonical: canonical.to_string(),
                    usage_count: 1,
                    created_at: now,
                    updated_at: now,
                },
            );
        })
    }

    fn query_components(
        &self,
        field: &str,
        category: &str,
    ) -> Result<Vec<ComponentLexiconRow>, StorageError> {
        self.with_tables(|t| {
            let mut rows: Vec<_> = t
                .components
                .values()
                .filter(|r| r.field == field && r.category == category)
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.usage_count
                    .cmp(&a.usage_count)
                    .then_with(|| a.value.cmp(&b.value))
            });
            rows
        })
    }
}

impl FieldAnchorMemory for InMemoryMemoryStore {
    fn upsert_anchor_at(
        &self,
        field: &str,
        category: &str,
        phrase: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_tables(|t| {
            let k = key(field, category, phrase);
            if let Some(row) = t.anchors.get_mut(&k) {
                row.usage_count += 1;
                row.updated_at = now;
                return;
            }
            let id = t.next_id();
            t.anchors.insert(
                k,
                FieldAnchorRow {
                    id,
                    field: field.to_string(),
                    category: category.to_string(),
                    phrase: phrase.to_string(),
                    usage_count: 1,
                    created_at: now,
                    updated_at: now,
                },
            );
        })
    }

    fn query_anchors(&self, field: &str, category: &str) -> Result<Vec<FieldAnchorRow>, StorageError> {
        self.with_tables(|t| {
            let mut rows: Vec<_> = t
                .anchors
                .values()
                .filter(|r| r.field == field && r.category == category)
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.usage_count
                    .cmp(&a.usage_count)
                    .then_with(|| a.phrase.cmp(&b.phrase))
            });
            rows
        })
    }
}

impl UrlMemory for InMemoryMemoryStore {
    fn upsert_url_at(
        &self,
        field: &str,
        category: &str,
        url: &str,
        root_domain: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_tables(|t| {
            let k = key(field, category, url);
            if let Some(row) = t.urls.get_mut(&k) {
                row.usage_count += 1;
                row.updated_at = now;
                return;
            }
            let id = t.next_id();
            t.urls.insert(
                k,
                UrlMemoryRow {
                    id,
                    field: field.to_string(),
                    category: category.to_string(),
                    url: url.to_string(),
                    root_domain: root_domain.to_string(),
                    usage_count: 1,
                    created_at: now,
                    updated_at: now,
                },
            );
        })
    }

    fn query_urls(&self, field: &str, category: &str) -> Result<Vec<UrlMemoryRow>, StorageError> {
        self.with_tables(|t| {
            let mut rows: Vec<_> = t
                .urls
                .values()
                .filter(|r| r.field == field && r.category == category)
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.usage_count
                    .cmp(&a.usage_count)
                    .then_with(|| a.url.cmp(&b.url))
            });
            rows
        })
    }
}

impl DomainYieldMemory for InMemoryMemoryStore {
    fn record_yield_at(
        &self,
        domain: &str,
        field: &str,
        category: &str,
        seen_delta: i64,
        used_delta: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let (seen_delta, used_delta) = (seen_delta.max(0), used_delta.max(0));
        self.with_tables(|t| {
            let k = key(domain, field, category);
            if let Some(row) = t.yields.get_mut(&k) {
                row.seen_count += seen_delta;
                row.used_count += used_delta;
                row.updated_at = now;
                return;
            }
            let id = t.next_id();
            t.yields.insert(
                k,
                DomainFieldYieldRow {
                    id,
                    domain: domain.to_string(),
                    field: field.to_string(),
                    category: category.to_string(),
                    seen_count: seen_delta,
                    used_count: used_delta,
                    created_at: now,
                    updated_at: now,
                },
            );
        })
    }

    fn query_yield(
        &self,
        field: &str,
        category: &str,
    ) -> Result<Vec<DomainFieldYieldRow>, StorageError> {
        self.with_tables(|t| {
            let mut rows: Vec<_> = t
                .yields
                .values()
                .filter(|r| r.field == field && r.category == category)
                .cloned()
                .collect();
            rows.sort_by(|a, b| {
                b.used_count
                    .cmp(&a.used_count)
                    .then_with(|| b.seen_count.cmp(&a.seen_count))
                    .then_with(|| a.domain.cmp(&b.domain))
            });
            rows
        })
    }

    fn low_yield_domains(
        &self,
        category: &str,
        min_seen: i64,
        max_yield: f64,
    ) -> Result<Vec<DomainYieldSummary>, StorageError> {
        self.with_tables(|t| {
            let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
            for row in t.yields.values().filter(|r| r.category == category) {
                let entry = totals.entry(row.domain.as_str()).or_default();
                entry.0 += row.seen_count;
                entry.1 += row.used_count;
            }
            let mut out: Vec<DomainYieldSummary> = totals
                .into_iter()
                .filter(|(_, (seen, _))| *seen >= min_seen)
                .map(|(domain, (seen, used))| DomainYieldSummary {
                    domain: domain.to_string(),
                    seen_count: seen,
                    used_count: used,
                    yield_ratio: yield_ratio(seen, used),
                })
                .filter(|s| s.yield_ratio <= max_yield)
                .collect();
            sort_low_yield(&mut out);
            out
        })
    }
}

impl MemoryStore for InMemoryMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}
