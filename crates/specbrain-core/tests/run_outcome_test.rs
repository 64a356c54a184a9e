//! Tests for lenient parsing of pipeline run documents.

use serde_json::json;
use specbrain_core::errors::{BrainError, BrainErrorCode, SchedulerError, StorageError};
use specbrain_core::RunOutcome;

fn sample_run() -> serde_json::Value {
    json!({
        "job": {
            "category": "mouse",
            "productId": "",
            "identityLock": { "brand": "Logitech G", "model": "G502 X", "variant": null }
        },
        "normalized": { "dpi": "25600", "weight": "unk", "sensor": "HERO 2" },
        "summary": {
            "validated": "true",
            "confidence": "0.91",
            "completenessRequired": 88,
            "coverageOverall": 0.7,
            "missingRequiredFields": ["weight", null, ""],
            "criticalFieldsBelowPassTarget": ["weight"],
            "contradictionCount": "2",
            "fieldReasoning": {
                "weight": { "unknownReason": "not_publicly_disclosed" },
                "broken": 42
            }
        },
        "provenance": {
            "dpi": {
                "value": "25600",
                "confidence": 0.95,
                "status": "accepted",
                "evidence": [
                    { "host": "www.logitechg.com", "url": "https://www.logitechg.com/g502x",
                      "tier": 1, "keyPath": "specs.max_dpi", "method": "network_json" },
                    "garbage"
                ]
            },
            "weight": null
        },
        "sourceResults": [
            {
                "url": "https://www.logitechg.com/g502x",
                "tier": "1",
                "role": "manufacturer",
                "approvedDomain": true,
                "identity": { "match": true, "criticalConflicts": [] },
                "anchorCheck": { "majorConflicts": [] },
                "fieldCandidates": [{ "field": "dpi", "value": "25600", "method": "network_json" }],
                "parserHealth": { "healthScore": "0.8" }
            }
        ],
        "discovery": {
            "candidates": [{ "url": "https://rtings.com/x", "provider": "bing", "query": "g502 x specs" }],
            "queries": ["g502 x specs", { "query": "g502 x weight" }, 7, null]
        }
    })
}

#[test]
fn lenient_fields_are_coerced() {
    let run: RunOutcome = serde_json::from_value(sample_run()).unwrap();
    assert!(run.summary.validated);
    assert!((run.summary.confidence - 0.91).abs() < 1e-9);
    assert!((run.summary.completeness_ratio() - 0.88).abs() < 1e-9);
    assert_eq!(run.summary.contradiction_count, 2);
    assert_eq!(run.summary.missing_required_fields, vec!["weight".to_string()]);
    assert_eq!(run.summary.unknown_reason("weight"), Some("not_publicly_disclosed"));
    assert!(!run.summary.field_reasoning.contains_key("broken"));
}

#[test]
fn malformed_entries_are_dropped_not_fatal() {
    let run: RunOutcome = serde_json::from_value(sample_run()).unwrap();
    assert_eq!(run.provenance.len(), 1);
    assert_eq!(run.provenance["dpi"].evidence.len(), 1);
    assert_eq!(run.provenance["dpi"].tier_history(), vec![1]);
    assert_eq!(run.discovery.queries, vec!["g502 x specs", "g502 x weight", "7"]);
}

#[test]
fn source_domains_are_derived_when_missing() {
    let run: RunOutcome = serde_json::from_value(sample_run()).unwrap();
    let source = &run.source_results[0];
    assert_eq!(source.tier, Some(1));
    assert_eq!(source.effective_host(), "www.logitechg.com");
    assert_eq!(source.effective_root_domain(), "logitechg.com");
    assert!(source.is_manufacturer());
    assert!(!source.has_brand_mismatch());
    assert_eq!(source.parser_health.health_score, Some(0.8));
    assert!(run.identity_matched_any());
}

#[test]
fn filled_fields_skip_unknown_tokens() {
    let run: RunOutcome = serde_json::from_value(sample_run()).unwrap();
    let filled: Vec<&str> = run.filled_fields().map(|(k, _)| k.as_str()).collect();
    assert_eq!(filled, vec!["dpi", "sensor"]);
}

#[test]
fn identity_key_falls_back_to_lock_slug() {
    let run: RunOutcome = serde_json::from_value(sample_run()).unwrap();
    assert_eq!(run.job.identity_key(), "logitech-g-g502-x");
}

#[test]
fn empty_document_is_default() {
    let run = RunOutcome::from_json("{}").unwrap();
    assert!(run.job.category.is_empty());
    assert!(!run.summary.validated);
    assert!(run.source_results.is_empty());
}

#[test]
fn subsystem_errors_convert_into_brain_error() {
    let err: BrainError = SchedulerError::DuplicateKey { key: "a".into() }.into();
    assert_eq!(err.error_code(), "DUPLICATE_KEY");
    let err: BrainError = StorageError::sqlite("disk I/O error").into();
    assert_eq!(err.error_code(), "STORAGE_ERROR");
}
