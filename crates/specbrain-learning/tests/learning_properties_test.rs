use std::collections::BTreeMap;

use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;
use specbrain_core::config::{AvailabilityThresholds, BanditMode, GateConfig};
use specbrain_core::RunOutcome;
use specbrain_learning::availability::{classify, AvailabilityClass};
use specbrain_learning::bandit::{rank_batch_with_bandit, ranked_keys, BanditCandidate};
use specbrain_learning::constraints::{update_constraints, FieldConstraints};
use specbrain_learning::gate::{evaluate_learning_gate, GateInput, GateReason};
use specbrain_learning::lexicon::{update_lexicon, FieldLexicon};
use specbrain_learning::profile::{merge_profile, HostStat, LearningProfile, ProfileUpdate};
use specbrain_learning::queries::{update_query_learning, QueryLearning};

fn arb_mode() -> impl Strategy<Value = BanditMode> {
    prop_oneof![Just(BanditMode::Explore), Just(BanditMode::Balanced), Just(BanditMode::Exploit)]
}

fn arb_candidate(key: String) -> impl Strategy<Value = BanditCandidate> {
    (0.0f64..=1.0, any::<bool>(), 0u64..5, 0u64..5, any::<bool>(), 0u64..20).prop_map(
        move |(confidence, validated, contradictions, missing, history, pulls)| BanditCandidate {
            key: key.clone(),
            confidence,
            validated,
            contradiction_count: contradictions,
            missing_critical_count: missing,
            has_history: history,
            pull_count: pulls,
            ..Default::default()
        },
    )
}

fn arb_batch() -> impl Strategy<Value = Vec<BanditCandidate>> {
    (1usize..8).prop_flat_map(|n| {
        (0..n)
            .map(|i| arb_candidate(format!("https://site{i}.com/")))
            .collect::<Vec<_>>()
    })
}

fn class_rank(class: AvailabilityClass) -> u8 {
    match class {
        AvailabilityClass::Rare => 0,
        AvailabilityClass::Sometimes => 1,
        AvailabilityClass::Expected => 2,
    }
}

proptest! {
    #[test]
    fn ranking_is_deterministic_and_order_independent(batch in arb_batch(), mode in arb_mode(), seed in "[a-z]{1,8}") {
        let rewards = BTreeMap::new();
        let first = rank_batch_with_bandit(&batch, &rewards, mode, &seed).unwrap();
        let again = rank_batch_with_bandit(&batch, &rewards, mode, &seed).unwrap();
        prop_assert_eq!(&first, &again);

        let mut reversed = batch.clone();
        reversed.reverse();
        let flipped = rank_batch_with_bandit(&reversed, &rewards, mode, &seed).unwrap();
        prop_assert_eq!(ranked_keys(&first), ranked_keys(&flipped));

        for pair in first.windows(2) {
            prop_assert!(pair[0].score > pair[1].score || (pair[0].score == pair[1].score && pair[0].key < pair[1].key));
        }
        for ranked in &first {
            prop_assert!((0.0..=1.0).contains(&ranked.thompson));
            prop_assert!((0.0..=2.0).contains(&ranked.info_need));
        }
    }

    #[test]
    fn availability_is_monotone_in_fill(seen in 0u64..200, filled_a in 0u64..200, filled_b in 0u64..200) {
        let t = AvailabilityThresholds::default();
        let (lo, hi) = if filled_a <= filled_b { (filled_a, filled_b) } else { (filled_b, filled_a) };
        let (lo, hi) = (lo.min(seen), hi.min(seen));
        let a = classify(seen, lo, 0, &t);
        let b = classify(seen, hi, 0, &t);
        prop_assert!(class_rank(a) <= class_rank(b));
        prop_assert_eq!(a, classify(seen, lo, 0, &t));
    }

    #[test]
    fn gate_never_accepts_below_threshold(
        confidence in 0.0f64..0.85,
        refs in 0u32..10,
        tiers in proptest::collection::vec(1u8..5, 0..4),
    ) {
        let input = GateInput {
            field: "dpi".into(),
            confidence,
            refs_found: refs,
            field_status: "accepted".into(),
            tier_history: tiers,
            ..Default::default()
        };
        let decision = evaluate_learning_gate(&input, &GateConfig::default());
        prop_assert!(!decision.accepted);
        prop_assert_eq!(decision.reason, GateReason::ConfidenceBelowThreshold);
    }

    #[test]
    fn learner_maps_stay_bounded(values in proptest::collection::vec("[a-z]{1,6}", 1..60), cap in 1usize..10) {
        let mut constraints = FieldConstraints::default();
        let mut lexicon = FieldLexicon::default();
        let mut queries = QueryLearning::default();
        for v in &values {
            let v = format!("c{v}");
            let run: RunOutcome = serde_json::from_value(json!({
                "summary": { "validated": true },
                "normalized": { "color": v },
                "provenance": { "color": { "value": v, "evidence": [{ "keyPath": format!("{v}x.{v}y"), "method": "dom" }] } },
                "discovery": { "queries": [format!("mouse {v}")] },
            }))
            .unwrap();
            constraints = update_constraints(constraints, &run, cap);
            lexicon = update_lexicon(lexicon, &run, Utc::now(), cap, cap);
            queries = update_query_learning(queries, &run, Utc::now(), cap, cap);
        }
        prop_assert!(constraints.fields["color"].allowed_values.len() <= cap);
        prop_assert!(lexicon.fields["color"].synonyms.len() <= cap);
        prop_assert!(queries.queries.len() <= cap);
        for view in queries.by_field.values() {
            prop_assert!(view.len() <= cap);
        }
    }

    #[test]
    fn profile_merge_never_loses_hosts(
        hosts in proptest::collection::btree_map("[a-z]{1,5}\\.com", (0u64..4, 0.0f64..=1.0), 0..6),
        fresh in proptest::collection::btree_map("[a-z]{1,5}\\.com", (0u64..4, 0.0f64..=1.0), 0..6),
    ) {
        let stats = |m: &BTreeMap<String, (u64, f64)>| -> Vec<HostStat> {
            m.iter()
                .map(|(h, (attempts, y))| HostStat { host: h.clone(), attempts: *attempts, yield_score: *y, ..Default::default() })
                .collect()
        };
        let base = merge_profile(
            LearningProfile::default(),
            "k",
            &ProfileUpdate { host_stats: stats(&hosts), ..Default::default() },
        );
        let merged = merge_profile(
            base.clone(),
            "k",
            &ProfileUpdate { host_stats: stats(&fresh), ..Default::default() },
        );
        prop_assert_eq!(merged.runs_total, base.runs_total + 1);
        for before in &base.host_stats {
            let after = merged.host(&before.host);
            prop_assert!(after.is_some());
            let after = after.unwrap();
            prop_assert!(after.attempts >= before.attempts);
            let fresh_attempts = fresh.get(&before.host).map(|(a, _)| *a).unwrap_or(0);
            if fresh_attempts == 0 {
                prop_assert_eq!(after, before);
            }
        }
    }
}
