//! Query learning: which discovery queries lead to successful runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specbrain_core::types::RunOutcome;
use specbrain_core::values;

use crate::artifact::{impl_brain_artifact, truncate_counts, ArtifactMeta};

const MAX_ROW_TAGS: usize = 24;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLearningRow {
    pub attempts: u64,
    pub success_count: f64,
    pub success_rate: f64,
    pub providers: BTreeMap<String, u64>,
    pub brands: BTreeMap<String, u64>,
    pub fields: BTreeMap<String, u64>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl QueryLearningRow {
    /// Ranking score of the top views.
    pub fn view_score(&self) -> f64 {
        self.success_rate * (1.0 + self.attempts as f64).ln()
    }

    /// Retention score; the lowest rows are evicted first.
    fn retention_score(&self) -> f64 {
        self.success_rate * (self.attempts.max(1) as f64).ln()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryView {
    pub query: String,
    pub attempts: u64,
    pub success_rate: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLearning {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub queries: BTreeMap<String, QueryLearningRow>,
    pub by_field: BTreeMap<String, Vec<QueryView>>,
    pub by_brand: BTreeMap<String, Vec<QueryView>>,
}

impl_brain_artifact!(QueryLearning, "query_templates");

/// Success signal of a run in [0, 1].
pub fn run_success_signal(run: &RunOutcome) -> f64 {
    let summary = &run.summary;
    if summary.validated {
        return 1.0;
    }
    let mut signal = 0.55 * summary.confidence_ratio();
    if run.identity_matched_any() {
        signal += 0.20;
    }
    if summary.missing_required_fields.is_empty() {
        signal += 0.15;
    }
    signal -= 0.05 * summary.critical_fields_below_pass_target.len() as f64;
    signal -= 0.04 * summary.contradiction_count as f64;
    values::clamp01(signal)
}

pub fn update_query_learning(
    mut artifact: QueryLearning,
    run: &RunOutcome,
    now: DateTime<Utc>,
    max_rows: usize,
    max_view: usize,
) -> QueryLearning {
    let mut providers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for query in &run.discovery.queries {
        providers.entry(values::normalize_token(query)).or_default();
    }
    for candidate in &run.discovery.candidates {
        let query = values::normalize_token(&candidate.query);
        let provider = values::normalize_token(&candidate.provider);
        let entry = providers.entry(query).or_default();
        if !provider.is_empty() {
            entry.insert(provider);
        }
    }
    providers.remove("");
    if providers.is_empty() {
        return artifact;
    }

    let signal = run_success_signal(run);
    let brand = values::normalize_token(run.brand());
    let fields: Vec<&String> = run.filled_fields().map(|(f, _)| f).collect();

    for (query, query_providers) in providers {
        let row = artifact.queries.entry(query).or_default();
        row.attempts += 1;
        row.success_count += signal;
        row.success_rate = values::clamp01(row.success_count / row.attempts as f64);
        row.last_seen = Some(now);
        for provider in query_providers {
            *row.providers.entry(provider).or_default() += 1;
        }
        if !brand.is_empty() {
            *row.brands.entry(brand.clone()).or_default() += 1;
        }
        for field in &fields {
            *row.fields.entry((*field).clone()).or_default() += 1;
        }
        truncate_counts(&mut row.providers, MAX_ROW_TAGS);
        truncate_counts(&mut row.brands, MAX_ROW_TAGS);
        truncate_counts(&mut row.fields, MAX_ROW_TAGS);
    }

    evict(&mut artifact.queries, max_rows);
    artifact.by_field = build_view(&artifact.queries, |r| &r.fields, max_view);
    artifact.by_brand = build_view(&artifact.queries, |r| &r.brands, max_view);
    artifact
}

fn evict(queries: &mut BTreeMap<String, QueryLearningRow>, max_rows: usize) {
    if queries.len() <= max_rows {
        return;
    }
    let mut ranked: Vec<(String, f64, Option<DateTime<Utc>>)> = queries
        .iter()
        .map(|(q, r)| (q.clone(), r.retention_score(), r.last_seen))
        .collect();
    ranked.sort_by(|a, b| {
        a.1.total_cmp(&b.1)
            .then_with(|| a.2.cmp(&b.2))
            .then_with(|| a.0.cmp(&b.0))
    });
    let excess = queries.len() - max_rows;
    for (query, _, _) in ranked.into_iter().take(excess) {
        queries.remove(&query);
    }
}

fn build_view(
    queries: &BTreeMap<String, QueryLearningRow>,
    tags: impl Fn(&QueryLearningRow) -> &BTreeMap<String, u64>,
    max_view: usize,
) -> BTreeMap<String, Vec<QueryView>> {
    let mut views: BTreeMap<String, Vec<QueryView>> = BTreeMap::new();
    for (query, row) in queries {
        for tag in tags(row).keys() {
            views.entry(tag.clone()).or_default().push(QueryView {
                query: query.clone(),
                attempts: row.attempts,
                success_rate: row.success_rate,
                score: row.view_score(),
            });
        }
    }
    for list in views.values_mut() {
        list.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.query.cmp(&b.query)));
        list.truncate(max_view);
    }
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(validated: bool, confidence: f64, queries: &[&str]) -> RunOutcome {
        serde_json::from_value(json!({
            "job": { "identityLock": { "brand": "Razer" } },
            "normalized": { "dpi": 26000 },
            "summary": { "validated": validated, "confidence": confidence, "missingRequiredFields": ["weight"] },
            "discovery": {
                "queries": queries,
                "candidates": [{ "url": "https://a.com", "provider": "Google", "query": queries.first().copied().unwrap_or("") }],
            },
        }))
        .unwrap()
    }

    #[test]
    fn validated_run_counts_full_success() {
        let q = update_query_learning(QueryLearning::default(), &run(true, 0.4, &["Razer Viper specs"]), Utc::now(), 1500, 8);
        let row = &q.queries["razer viper specs"];
        assert_eq!(row.attempts, 1);
        assert_eq!(row.success_rate, 1.0);
        assert_eq!(row.providers["google"], 1);
        assert_eq!(row.brands["razer"], 1);
        assert_eq!(q.by_field["dpi"][0].query, "razer viper specs");
        assert_eq!(q.by_brand["razer"].len(), 1);
    }

    #[test]
    fn unvalidated_signal_blends_confidence() {
        let r = run(false, 0.8, &["x"]);
        assert!((run_success_signal(&r) - 0.44).abs() < 1e-9);
        let q = update_query_learning(QueryLearning::default(), &r, Utc::now(), 1500, 8);
        let q = update_query_learning(q, &run(true, 0.8, &["x"]), Utc::now(), 1500, 8);
        assert!((q.queries["x"].success_rate - 0.72).abs() < 1e-9);
    }

    #[test]
    fn runs_without_queries_change_nothing() {
        let q = update_query_learning(QueryLearning::default(), &run(true, 1.0, &[]), Utc::now(), 1500, 8);
        assert!(q.queries.is_empty());
    }

    #[test]
    fn eviction_drops_weakest_rows() {
        let mut q = QueryLearning::default();
        q = update_query_learning(q, &run(true, 1.0, &["good"]), Utc::now(), 2, 8);
        q = update_query_learning(q, &run(true, 1.0, &["good"]), Utc::now(), 2, 8);
        q = update_query_learning(q, &run(false, 0.0, &["bad"]), Utc::now(), 2, 8);
        q = update_query_learning(q, &run(true, 1.0, &["new"]), Utc::now(), 2, 8);
        assert_eq!(q.queries.len(), 2);
        assert!(q.queries.contains_key("good"));
        assert!(!q.queries.contains_key("bad"));
    }
}
