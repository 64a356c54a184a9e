//! Tests for the JSON and SQLite artifact stores.

use std::sync::Arc;

use serde_json::json;
use specbrain_core::errors::{BrainError, BrainErrorCode};
use specbrain_storage::{ArtifactStore, DatabaseManager, JsonArtifactStore, SqliteArtifactStore};

#[test]
fn json_store_missing_document_is_none() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path());
    assert!(store.load("mouse", "constraints").unwrap().is_none());
}

#[test]
fn json_store_writes_category_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path());
    let doc = json!({ "version": 1, "updated_at": "2025-01-01T00:00:00Z", "fields": {} });
    store.save("Gaming Mouse", "field_lexicon", &doc).unwrap();

    let path = dir.path().join("gaming_mouse").join("field_lexicon.json");
    assert!(path.exists());
    assert_eq!(store.load("Gaming Mouse", "field_lexicon").unwrap(), Some(doc));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("gaming_mouse"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn json_store_corrupt_document_is_parse_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path());
    std::fs::create_dir_all(dir.path().join("mouse")).unwrap();
    std::fs::write(dir.path().join("mouse").join("stats.json"), "{ not json").unwrap();

    let err = store.load("mouse", "stats").unwrap_err();
    assert!(matches!(err, BrainError::Artifact(_)));
    assert_eq!(err.error_code(), "ARTIFACT_PARSE");
}

#[test]
fn concurrent_json_writes_leave_a_complete_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(JsonArtifactStore::new(dir.path()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let doc = json!({ "version": 1, "writer": i, "payload": vec![i; 256] });
                store.save("mouse", "stats", &doc).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let doc = store.load("mouse", "stats").unwrap().unwrap();
    let writer = doc["writer"].as_u64().unwrap();
    assert_eq!(doc["payload"].as_array().unwrap().len(), 256);
    assert!(doc["payload"]
        .as_array()
        .unwrap()
        .iter()
        .all(|v| v.as_u64() == Some(writer)));
}

#[test]
fn sqlite_store_roundtrips_documents() {
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    let store = SqliteArtifactStore::new(db);
    assert!(store.load("mouse", "stats").unwrap().is_none());

    store.save("mouse", "stats", &json!({ "version": 1, "runs_total": 3 })).unwrap();
    store.save("mouse", "stats", &json!({ "version": 1, "runs_total": 4 })).unwrap();
    store.save("mouse", "constraints", &json!({ "version": 1 })).unwrap();

    let doc = store.load("mouse", "stats").unwrap().unwrap();
    assert_eq!(doc["runs_total"], 4);
    assert_eq!(store.kinds("mouse").unwrap(), vec!["constraints", "stats"]);
}
