use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use specbrain_core::config::{BrainConfig, DecayConfig, PersistMode};
use specbrain_core::errors::{BrainResult, StorageError};
use specbrain_core::RunOutcome;
use specbrain_orchestrator::degradation::{artifact_document, MEMORY_STORE, PRIMARY_ARTIFACT_STORE};
use specbrain_orchestrator::RecoveryStatus;
use specbrain_orchestrator::BrainOrchestrator;
use specbrain_storage::memory::{DomainYieldMemory, FieldAnchorMemory, UrlMemory};
use specbrain_storage::{
    ArtifactStore, DatabaseManager, InMemoryMemoryStore, JsonArtifactStore, MemoryStore, SqliteArtifactStore,
};

struct FailingStore;

impl ArtifactStore for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn load(&self, _category: &str, _kind: &str) -> BrainResult<Option<Value>> {
        Err(StorageError::Unavailable {
            message: "primary offline".into(),
        }
        .into())
    }

    fn save(&self, _category: &str, _kind: &str, _document: &Value) -> BrainResult<()> {
        Err(StorageError::Unavailable {
            message: "primary offline".into(),
        }
        .into())
    }
}

fn config(mode: PersistMode) -> BrainConfig {
    let mut config = BrainConfig::default();
    config.storage.persist_mode = Some(mode);
    config
}

fn memory() -> Arc<dyn MemoryStore> {
    Arc::new(InMemoryMemoryStore::new(DecayConfig::default()))
}

fn run() -> RunOutcome {
    serde_json::from_value(json!({
        "job": {
            "category": "mouse",
            "productId": "mouse-logitech-g502-x",
            "identityLock": { "brand": "Logitech G", "model": "G502 X" },
        },
        "normalized": { "weight": 89, "sensor": "HERO 25K", "polling_rate": "unk" },
        "summary": {
            "validated": true,
            "confidence": 0.9,
            "completenessRequired": 0.8,
            "missingRequiredFields": ["polling_rate"],
        },
        "provenance": {
            "weight": {
                "value": 89,
                "confidence": 0.95,
                "status": "accepted",
                "evidence": [
                    { "url": "https://www.logitechg.com/g502-x", "tier": 1, "keyPath": "Specs.Weight" },
                    { "url": "https://www.rtings.com/mouse/g502-x", "tier": 2, "keyPath": "specs.weight" },
                ],
            },
            "sensor": {
                "value": "HERO 25K",
                "confidence": 0.5,
                "status": "accepted",
                "evidence": [{ "url": "https://www.logitechg.com/g502-x", "tier": 1 }],
            },
        },
        "sourceResults": [{
            "url": "https://www.logitechg.com/g502-x",
            "tier": 1,
            "role": "manufacturer",
            "identity": { "match": true },
            "fieldCandidates": [
                { "field": "weight", "method": "json_ld" },
                { "field": "polling_rate", "method": "dom" },
            ],
        }],
    }))
    .unwrap()
}

#[test]
fn update_persists_json_documents_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BrainOrchestrator::open(config(PersistMode::Json), dir.path());

    let report = orchestrator.update("mouse", &run()).unwrap();
    assert!(report.validated);
    assert_eq!(report.identity_key, "mouse-logitech-g502-x");

    let learning = dir.path().join("_learning").join("mouse");
    assert!(learning.join("stats.json").exists());
    assert!(learning.join("field_availability.json").exists());
    assert!(learning.join("profile_mouse-logitech-g502-x.json").exists());

    orchestrator.update("mouse", &run()).unwrap();
    let brain = orchestrator.load("mouse").unwrap();
    assert_eq!(brain.stats.runs_total, 2);
    assert_eq!(brain.stats.validated_runs, 2);
    assert_eq!(brain.availability.fields["weight"].validated_seen, 2);
    assert!(brain.stats.meta.updated_at.is_some());

    let profile = orchestrator.load_profile("mouse", "mouse-logitech-g502-x").unwrap();
    assert_eq!(profile.runs_total, 2);
    assert!(orchestrator.degradations().is_empty());
}

#[test]
fn only_gate_accepted_facts_reach_memory() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BrainOrchestrator::open(config(PersistMode::Json), dir.path());
    let report = orchestrator.update("mouse", &run()).unwrap();

    let accepted: BTreeMap<&str, bool> = report
        .gate_decisions
        .iter()
        .map(|d| (d.field.as_str(), d.accepted))
        .collect();
    assert_eq!(accepted, BTreeMap::from([("sensor", false), ("weight", true)]));
    assert_eq!(report.memory_failures, 0);

    let memory = orchestrator.memory();
    let urls = memory.query_urls("weight", "mouse").unwrap();
    assert_eq!(urls.len(), 2);
    let anchors = memory.query_anchors("weight", "mouse").unwrap();
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].phrase, "specs.weight");
    assert!(memory.query_urls("sensor", "mouse").unwrap().is_empty());

    let yields = memory.query_yield("weight", "mouse").unwrap();
    assert!(yields.iter().any(|r| r.domain == "logitechg.com" && r.used_count == 1));
}

#[test]
fn truncated_document_resets_only_its_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BrainOrchestrator::open(config(PersistMode::Json), dir.path());
    orchestrator.update("mouse", &run()).unwrap();

    let lexicon = dir.path().join("_learning").join("mouse").join("field_lexicon.json");
    std::fs::write(&lexicon, r#"{"fields": {"#).unwrap();

    let report = orchestrator.report("mouse").unwrap();
    assert_eq!(report.degraded_components, vec![artifact_document("field_lexicon")]);
    assert_eq!(report.stats.runs_total, 1);

    orchestrator.update("mouse", &run()).unwrap();
    let brain = orchestrator.load("mouse").unwrap();
    assert_eq!(brain.stats.runs_total, 2);
    assert!(brain.lexicon.fields.contains_key("weight"));

    let events = orchestrator.degradations();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.component, "artifact.field_lexicon");
    assert_eq!(events[0].recovery_status, RecoveryStatus::Recovered);
    assert!(orchestrator.report("mouse").unwrap().degraded_components.is_empty());
}

#[test]
fn failing_primary_falls_back_to_json_and_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let json: Arc<dyn ArtifactStore> = Arc::new(JsonArtifactStore::new(dir.path()));
    let orchestrator = BrainOrchestrator::with_stores(
        config(PersistMode::Sqlite),
        Some(Arc::new(FailingStore)),
        Arc::clone(&json),
        memory(),
    );

    orchestrator.update("mouse", &run()).unwrap();
    assert!(json.load("mouse", "stats").unwrap().is_some());

    let degradations = orchestrator.degradations();
    assert_eq!(degradations.len(), 1);
    assert_eq!(degradations[0].event.component, PRIMARY_ARTIFACT_STORE);
    assert_eq!(degradations[0].event.fallback_used, "json");

    let report = orchestrator.report("mouse").unwrap();
    assert_eq!(report.degraded_components, vec![PRIMARY_ARTIFACT_STORE.to_string()]);
    assert_eq!(report.stats.runs_total, 1);
}

#[test]
fn sqlite_mode_writes_primary_only() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let primary: Arc<dyn ArtifactStore> = Arc::new(SqliteArtifactStore::new(db));
    let json: Arc<dyn ArtifactStore> = Arc::new(JsonArtifactStore::new(dir.path()));
    let orchestrator = BrainOrchestrator::with_stores(
        config(PersistMode::Sqlite),
        Some(Arc::clone(&primary)),
        Arc::clone(&json),
        memory(),
    );

    orchestrator.update("mouse", &run()).unwrap();
    assert!(primary.load("mouse", "stats").unwrap().is_some());
    assert!(json.load("mouse", "stats").unwrap().is_none());
    assert_eq!(orchestrator.load("mouse").unwrap().stats.runs_total, 1);
}

#[test]
fn dual_write_keeps_both_stores_current() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let primary: Arc<dyn ArtifactStore> = Arc::new(SqliteArtifactStore::new(db));
    let json: Arc<dyn ArtifactStore> = Arc::new(JsonArtifactStore::new(dir.path()));
    let orchestrator = BrainOrchestrator::with_stores(
        config(PersistMode::DualWrite),
        Some(Arc::clone(&primary)),
        Arc::clone(&json),
        memory(),
    );

    orchestrator.update("mouse", &run()).unwrap();
    orchestrator.update("mouse", &run()).unwrap();
    let from_primary = primary.load("mouse", "stats").unwrap().unwrap();
    let from_json = json.load("mouse", "stats").unwrap().unwrap();
    assert_eq!(from_primary["runs_total"], json!(2));
    assert_eq!(from_primary, from_json);
}

#[test]
fn primary_miss_reads_existing_json_documents() {
    let dir = tempfile::tempdir().unwrap();
    let json: Arc<dyn ArtifactStore> = Arc::new(JsonArtifactStore::new(dir.path()));
    json.save("mouse", "stats", &json!({ "runs_total": 7, "validated_runs": 3 }))
        .unwrap();
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let orchestrator = BrainOrchestrator::with_stores(
        config(PersistMode::Sqlite),
        Some(Arc::new(SqliteArtifactStore::new(db))),
        json,
        memory(),
    );

    assert_eq!(orchestrator.load("mouse").unwrap().stats.runs_total, 7);
    orchestrator.update("mouse", &run()).unwrap();
    assert_eq!(orchestrator.load("mouse").unwrap().stats.runs_total, 8);
}

#[test]
fn suggested_domains_are_promoted_once() {
    let dir = tempfile::tempdir().unwrap();
    let json: Arc<dyn ArtifactStore> = Arc::new(JsonArtifactStore::new(dir.path()));
    json.save(
        "mouse",
        "promotion_suggestions",
        &json!({ "suggestions": [
            { "domain": "www.rtings.com", "attempts": 12, "identity_match_rate": 0.95,
              "major_conflict_rate": 0.0, "field_yield_rate": 0.6 },
        ]}),
    )
    .unwrap();
    let orchestrator =
        BrainOrchestrator::with_stores(config(PersistMode::Json), None, Arc::clone(&json), memory());

    let first = orchestrator.update("mouse", &run()).unwrap();
    assert_eq!(first.promoted, vec!["rtings.com".to_string()]);
    let second = orchestrator.update("mouse", &run()).unwrap();
    assert!(second.promoted.is_empty());

    let overrides = json.load("mouse", "source_overrides").unwrap().unwrap();
    assert_eq!(overrides["approved"]["quarantine"], json!(["rtings.com"]));
    let report = orchestrator.report("mouse").unwrap();
    assert_eq!(report.recent_promotions.len(), 1);
    assert_eq!(report.recent_promotions[0].domain, "rtings.com");
}

#[test]
fn report_summarises_learned_state() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BrainOrchestrator::open(config(PersistMode::Json), dir.path());
    orchestrator.update("mouse", &run()).unwrap();

    let report = orchestrator.report("mouse").unwrap();
    assert_eq!(report.category, "mouse");
    assert_eq!(report.stats.runs_total, 1);
    assert!(report.availability.fields_total >= 2);
    assert!(report.top_yield_domains.iter().any(|d| d.domain == "logitechg.com"));
    assert!(report.degraded_components.is_empty());

    let empty = orchestrator.report("keyboard").unwrap();
    assert_eq!(empty.stats.runs_total, 0);
    assert!(empty.top_yield_domains.is_empty());
}

#[test]
fn unopenable_database_degrades_to_json_and_memory() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(PersistMode::Sqlite);
    config.storage.db_path = Some(".".into());
    let orchestrator = BrainOrchestrator::open(config, dir.path());

    assert_eq!(orchestrator.memory().backend(), "memory");
    let components: Vec<String> = orchestrator
        .degradations()
        .into_iter()
        .map(|d| d.event.component)
        .collect();
    assert!(components.contains(&PRIMARY_ARTIFACT_STORE.to_string()));
    assert!(components.contains(&MEMORY_STORE.to_string()));

    orchestrator.update("mouse", &run()).unwrap();
    assert_eq!(orchestrator.load("mouse").unwrap().stats.runs_total, 1);
}

#[test]
fn ranking_uses_configured_seed() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BrainOrchestrator::open(config(PersistMode::Json), dir.path());
    let rows = vec![
        json!({ "key": "https://a.com/1", "confidence": 0.9, "validated": true, "has_history": true }),
        json!({ "key": "https://b.com/2", "missing_critical_count": 3 }),
        json!({ "url": "https://c.com/3", "contradiction_count": 1 }),
    ];
    let first = orchestrator.rank_candidates(&rows, &BTreeMap::new(), None).unwrap();
    let second = orchestrator.rank_candidates(&rows, &BTreeMap::new(), None).unwrap();
    let keys = |r: &[specbrain_learning::RankedCandidate]| r.iter().map(|c| c.key.clone()).collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(first.len(), 3);

    let duplicate = vec![json!({ "key": "x" }), json!({ "key": "x" })];
    assert!(orchestrator.rank_candidates(&duplicate, &BTreeMap::new(), None).is_err());
}

#[test]
fn hypothesis_queue_reads_stored_source_intel() {
    let dir = tempfile::tempdir().unwrap();
    let json: Arc<dyn ArtifactStore> = Arc::new(JsonArtifactStore::new(dir.path()));
    json.save(
        "mouse",
        "source_intel",
        &json!({ "domains": { "rtings.com": { "per_field_helpfulness": { "polling_rate": 1.0 } } } }),
    )
    .unwrap();
    let orchestrator = BrainOrchestrator::with_stores(config(PersistMode::Json), None, json, memory());

    let queue = orchestrator.hypothesis_queue("mouse", &run()).unwrap();
    let entry = queue.iter().find(|e| e.field == "polling_rate").unwrap();
    assert!(entry.suggestions.iter().any(|s| s.url == "https://rtings.com/"));
}
