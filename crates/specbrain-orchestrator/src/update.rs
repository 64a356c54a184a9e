//! Learner fan-out and gated memory writes for one run.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specbrain_core::config::{BrainConfig, GateConfig};
use specbrain_core::errors::StorageError;
use specbrain_core::types::RunOutcome;
use specbrain_core::values;
use specbrain_learning::availability::update_field_availability;
use specbrain_learning::constraints::update_constraints;
use specbrain_learning::field_yield::{compute_yield_deltas, update_field_yield, YieldDelta};
use specbrain_learning::gate::{evaluate_learning_gate, GateDecision, GateInput};
use specbrain_learning::lexicon::update_lexicon;
use specbrain_learning::promotion::apply_promotions;
use specbrain_learning::queries::update_query_learning;
use specbrain_learning::stats::update_stats;
use specbrain_storage::memory::{ComponentLexiconMemory, DomainYieldMemory, FieldAnchorMemory, UrlMemory};
use specbrain_storage::MemoryStore;

use crate::brain::CategoryBrain;

/// What one `update` call did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub category: String,
    pub identity_key: String,
    pub validated: bool,
    pub gate_decisions: Vec<GateDecision>,
    pub promoted: Vec<String>,
    pub memory_writes: usize,
    pub memory_failures: usize,
    pub yield_deltas: usize,
}

pub(crate) struct LearnerOutput {
    pub brain: CategoryBrain,
    pub deltas: Vec<YieldDelta>,
    pub promoted: Vec<String>,
}

/// Run every learner over the brain. Learners share no mutable state, so the
/// independent ones run in parallel.
pub(crate) fn apply_learners(
    brain: CategoryBrain,
    run: &RunOutcome,
    config: &BrainConfig,
    now: DateTime<Utc>,
) -> LearnerOutput {
    let CategoryBrain {
        category,
        availability,
        constraints,
        lexicon,
        queries,
        field_yield,
        overrides,
        promotions,
        stats,
        source_intel,
        promotion_suggestions,
    } = brain;
    let caps = &config.caps;
    let thresholds = config.availability.thresholds_for(&category);
    let deltas = compute_yield_deltas(run);

    let ((availability, constraints), (lexicon, (queries, field_yield))) = rayon::join(
        || {
            rayon::join(
                || {
                    let _span = specbrain_core::learning_span!("availability", category).entered();
                    update_field_availability(availability, run, &thresholds, caps.effective_max_top_domains())
                },
                || {
                    let _span = specbrain_core::learning_span!("constraints", category).entered();
                    update_constraints(constraints, run, caps.effective_max_allowed_values())
                },
            )
        },
        || {
            rayon::join(
                || {
                    let _span = specbrain_core::learning_span!("lexicon", category).entered();
                    update_lexicon(
                        lexicon,
                        run,
                        now,
                        caps.effective_max_lexicon_synonyms(),
                        caps.effective_max_lexicon_units(),
                    )
                },
                || {
                    rayon::join(
                        || {
                            let _span = specbrain_core::learning_span!("queries", category).entered();
                            update_query_learning(
                                queries,
                                run,
                                now,
                                caps.effective_max_query_rows(),
                                caps.effective_max_query_view(),
                            )
                        },
                        || {
                            let _span = specbrain_core::learning_span!("field_yield", category).entered();
                            update_field_yield(field_yield, run, &deltas)
                        },
                    )
                },
            )
        },
    );

    let stats = update_stats(stats, run, now);
    let promotion = apply_promotions(
        overrides,
        promotions,
        &promotion_suggestions,
        &config.promotion,
        now,
        caps.effective_max_promotion_log(),
    );

    LearnerOutput {
        brain: CategoryBrain {
            category,
            availability,
            constraints,
            lexicon,
            queries,
            field_yield,
            overrides: promotion.overrides,
            promotions: promotion.log,
            stats,
            source_intel,
            promotion_suggestions,
        },
        deltas,
        promoted: promotion.promoted,
    }
}

pub(crate) struct MemoryWrites {
    pub decisions: Vec<GateDecision>,
    pub written: usize,
    pub errors: Vec<StorageError>,
}

impl MemoryWrites {
    fn track(&mut self, result: Result<(), StorageError>) {
        match result {
            Ok(()) => self.written += 1,
            Err(e) => self.errors.push(e),
        }
    }
}

/// Write gate-accepted facts into URL, anchor and component memory, and
/// always record domain-field yield counters. Write failures are collected,
/// never propagated.
pub(crate) fn write_memories(
    memory: &dyn MemoryStore,
    category: &str,
    run: &RunOutcome,
    gate: &GateConfig,
    deltas: &[YieldDelta],
    now: DateTime<Utc>,
) -> MemoryWrites {
    let mut writes = MemoryWrites {
        decisions: Vec::new(),
        written: 0,
        errors: Vec::new(),
    };

    for (field, provenance) in &run.provenance {
        if !values::is_known_value(&provenance.value) {
            continue;
        }
        let decision = evaluate_learning_gate(&GateInput::from_provenance(field, provenance), gate);
        if decision.accepted {
            let mut urls = BTreeSet::new();
            let mut anchors = BTreeSet::new();
            for evidence in &provenance.evidence {
                let url = evidence.url.trim();
                if !url.is_empty() && urls.insert(url) {
                    let root = evidence.effective_root_domain();
                    writes.track(memory.upsert_url_at(field, category, url, &root, now));
                }
                let phrase = values::normalize_token(&evidence.key_path);
                if !phrase.is_empty() && anchors.insert(phrase.clone()) {
                    writes.track(memory.upsert_anchor_at(field, category, &phrase, now));
                }
            }
            if let Some(component) = provenance.component_ref.as_deref() {
                let value = values::normalize_token(&values::value_text(&provenance.value));
                writes.track(memory.upsert_component_at(field, category, &value, component, now));
            }
        } else {
            tracing::debug!(%field, reason = %decision.reason, "learning gate rejected field");
        }
        writes.decisions.push(decision);
    }

    for delta in deltas {
        let seen = i64::try_from(delta.seen_delta).unwrap_or(i64::MAX);
        let used = i64::try_from(delta.used_delta).unwrap_or(i64::MAX);
        writes.track(memory.record_yield_at(&delta.domain, &delta.field, category, seen, used, now));
    }
    writes
}
