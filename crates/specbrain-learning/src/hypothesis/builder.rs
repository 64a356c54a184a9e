//! Hypothesis queue construction and flattening.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use specbrain_core::config::HypothesisConfig;
use specbrain_core::types::{RunOutcome, SourceResult};
use specbrain_core::values;

use super::scoring::{method_weight, source_quality};
use super::source_intel::SourceIntel;

pub const REASON_EXISTING_EVIDENCE: &str = "existing_evidence_not_confirmed";
pub const REASON_ENDPOINT_HINT: &str = "endpoint_signal_hint";
pub const REASON_HISTORICAL_DOMAIN: &str = "historical_domain_helpful";
pub const REASON_HISTORICAL_PATH: &str = "historical_path_helpful";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    FetchedSource,
    Endpoint,
    HistoricalDomain,
    HistoricalPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisSuggestion {
    pub url: String,
    pub root_domain: String,
    pub source_type: SourceType,
    pub score: f64,
    /// Reason of the highest-scoring signal.
    pub reason: String,
    /// Every reason that pointed at this URL.
    pub reasons: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisQueueEntry {
    pub field: String,
    pub critical: bool,
    pub priority: f64,
    pub suggestions: Vec<HypothesisSuggestion>,
}

/// One URL of the flattened queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedUrl {
    pub url: String,
    pub root_domain: String,
    pub score: f64,
    pub fields: BTreeSet<String>,
}

/// Build the ordered queue of fields still needing evidence, each with its
/// best URLs to try next.
pub fn build_hypothesis_queue(
    run: &RunOutcome,
    intel: &SourceIntel,
    config: &HypothesisConfig,
) -> Vec<HypothesisQueueEntry> {
    let summary = &run.summary;
    let critical: BTreeSet<&str> = summary
        .critical_fields_below_pass_target
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    let targets: BTreeSet<&str> = critical
        .iter()
        .copied()
        .chain(summary.missing_required_fields.iter().map(|f| f.trim()))
        .filter(|f| !f.is_empty())
        .collect();
    if targets.is_empty() {
        return Vec::new();
    }

    let below: BTreeSet<&str> = summary.fields_below_pass_target.iter().map(|f| f.trim()).collect();
    let brand = values::normalize_token(run.brand());
    let usable: Vec<&SourceResult> = run
        .source_results
        .iter()
        .filter(|s| !(s.is_manufacturer() && s.has_brand_mismatch()))
        .filter(|s| !s.url.trim().is_empty())
        .collect();
    let per_field_limit = config.effective_per_field_limit();

    let mut queue: Vec<HypothesisQueueEntry> = targets
        .into_iter()
        .map(|field| {
            let mut merged = SuggestionSet::default();
            existing_evidence(field, &usable, &mut merged);
            endpoint_hints(field, &usable, &mut merged);
            historical(field, &brand, intel, &mut merged);

            let is_critical = critical.contains(field);
            let has_value = run.normalized.get(field).is_some_and(values::is_known_value);
            let is_below = is_critical || below.contains(field);
            let confidence = run
                .provenance
                .get(field)
                .map(|p| values::clamp01(p.confidence))
                .unwrap_or(0.0);
            let priority = if is_critical { 2.0 } else { 1.0 }
                + if has_value { 0.0 } else { 0.8 }
                + if is_below { 0.4 } else { 0.0 }
                + (1.0 - confidence);

            HypothesisQueueEntry {
                field: field.to_string(),
                critical: is_critical,
                priority,
                suggestions: merged.into_sorted(per_field_limit),
            }
        })
        .collect();

    queue.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then_with(|| b.suggestions.len().cmp(&a.suggestions.len()))
            .then_with(|| a.field.cmp(&b.field))
    });
    queue.truncate(config.effective_max_items());
    tracing::debug!(fields = queue.len(), "hypothesis queue built");
    queue
}

/// Flatten a queue into one URL list, optionally restricted to one field.
/// Each URL keeps its best score; order is score desc, then URL.
pub fn next_best_urls_from_hypotheses(
    queue: &[HypothesisQueueEntry],
    field: Option<&str>,
    limit: usize,
) -> Vec<RankedUrl> {
    let mut by_url: BTreeMap<&str, RankedUrl> = BTreeMap::new();
    for entry in queue.iter().filter(|e| field.map_or(true, |f| e.field == f)) {
        for s in &entry.suggestions {
            let ranked = by_url.entry(s.url.as_str()).or_insert_with(|| RankedUrl {
                url: s.url.clone(),
                root_domain: s.root_domain.clone(),
                score: s.score,
                fields: BTreeSet::new(),
            });
            ranked.score = ranked.score.max(s.score);
            ranked.fields.insert(entry.field.clone());
        }
    }
    let mut urls: Vec<RankedUrl> = by_url.into_values().collect();
    urls.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.url.cmp(&b.url)));
    urls.truncate(limit);
    urls
}

/// Suggestions keyed by URL; merging keeps the max score and unions reasons.
#[derive(Default)]
struct SuggestionSet {
    by_url: BTreeMap<String, HypothesisSuggestion>,
}

impl SuggestionSet {
    fn add(&mut self, url: &str, source_type: SourceType, score: f64, reason: &str) {
        let url = url.trim();
        if url.is_empty() || !score.is_finite() {
            return;
        }
        match self.by_url.get_mut(url) {
            Some(existing) => {
                existing.reasons.insert(reason.to_string());
                if score > existing.score {
                    existing.score = score;
                    existing.source_type = source_type;
                    existing.reason = reason.to_string();
                }
            }
            None => {
                self.by_url.insert(
                    url.to_string(),
                    HypothesisSuggestion {
                        url: url.to_string(),
                        root_domain: values::root_domain(&values::host_of(url)),
                        source_type,
                        score,
                        reason: reason.to_string(),
                        reasons: BTreeSet::from([reason.to_string()]),
                    },
                );
            }
        }
    }

    fn into_sorted(self, limit: usize) -> Vec<HypothesisSuggestion> {
        let mut out: Vec<_> = self.by_url.into_values().collect();
        out.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.url.cmp(&b.url)));
        out.truncate(limit);
        out
    }
}

fn existing_evidence(field: &str, sources: &[&SourceResult], out: &mut SuggestionSet) {
    for source in sources {
        let best_method = source
            .field_candidates
            .iter()
            .filter(|c| c.field.trim() == field)
            .map(|c| method_weight(&c.method))
            .max_by(f64::total_cmp);
        if let Some(weight) = best_method {
            out.add(
                &source.url,
                SourceType::FetchedSource,
                source_quality(source) + weight,
                REASON_EXISTING_EVIDENCE,
            );
        }
    }
}

fn endpoint_hints(field: &str, sources: &[&SourceResult], out: &mut SuggestionSet) {
    for source in sources {
        let quality = source_quality(source);
        for endpoint in &source.endpoint_suggestions {
            if endpoint.field_hints.iter().any(|h| h.trim() == field) {
                out.add(
                    &endpoint.url,
                    SourceType::Endpoint,
                    1.5 + endpoint.score + 0.25 * quality,
                    REASON_ENDPOINT_HINT,
                );
            }
        }
    }
}

fn historical(field: &str, brand: &str, intel: &SourceIntel, out: &mut SuggestionSet) {
    for (domain, domain_intel) in &intel.domains {
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            continue;
        }
        let planner = domain_intel.planner_score();
        let helpfulness = domain_intel.helpfulness(field, brand);
        if helpfulness > 0.0 {
            out.add(
                &format!("https://{domain}/"),
                SourceType::HistoricalDomain,
                helpfulness + planner,
                REASON_HISTORICAL_DOMAIN,
            );
        }
        for (path, fields) in &domain_intel.per_path {
            let Some(h) = fields.get(field).copied().filter(|h| h.is_finite() && *h > 0.0) else {
                continue;
            };
            let path = path.trim();
            let url = if path.starts_with('/') {
                format!("https://{domain}{path}")
            } else {
                format!("https://{domain}/{path}")
            };
            out.add(&url, SourceType::HistoricalPath, h + planner, REASON_HISTORICAL_PATH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run_with(sources: serde_json::Value, summary: serde_json::Value) -> RunOutcome {
        serde_json::from_value(json!({
            "job": { "category": "mouse", "identityLock": { "brand": "Razer", "model": "Viper" } },
            "summary": summary,
            "sourceResults": sources,
        }))
        .unwrap()
    }

    #[test]
    fn no_targets_no_queue() {
        let run = run_with(json!([]), json!({ "validated": true }));
        assert!(build_hypothesis_queue(&run, &SourceIntel::default(), &HypothesisConfig::default()).is_empty());
    }

    #[test]
    fn critical_fields_outrank_missing() {
        let run = run_with(
            json!([]),
            json!({ "missingRequiredFields": ["weight"], "criticalFieldsBelowPassTarget": ["sensor"] }),
        );
        let queue = build_hypothesis_queue(&run, &SourceIntel::default(), &HypothesisConfig::default());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].field, "sensor");
        assert!(queue[0].critical);
        assert!((queue[0].priority - 4.2).abs() < 1e-9);
        assert!((queue[1].priority - 2.8).abs() < 1e-9);
        assert!(queue[1].suggestions.is_empty());
    }

    #[test]
    fn same_url_merges_reasons() {
        let run = run_with(
            json!([{
                "url": "https://razer.com/viper",
                "role": "manufacturer",
                "tier": 1,
                "identity": { "match": true },
                "fieldCandidates": [{ "field": "dpi", "method": "dom" }],
                "endpointSuggestions": [{ "url": "https://razer.com/viper", "fieldHints": ["dpi"], "score": 5.0 }],
            }]),
            json!({ "missingRequiredFields": ["dpi"] }),
        );
        let queue = build_hypothesis_queue(&run, &SourceIntel::default(), &HypothesisConfig::default());
        let s = &queue[0].suggestions;
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].reasons.len(), 2);
        // quality 4.7 + dom 0.6 = 5.3 loses to 1.5 + 5.0 + 0.25 * 4.7.
        assert_eq!(s[0].reason, REASON_ENDPOINT_HINT);
        assert!((s[0].score - 7.675).abs() < 1e-9);
    }

    #[test]
    fn brand_mismatched_manufacturer_excluded() {
        let run = run_with(
            json!([{
                "url": "https://other.com/p",
                "role": "manufacturer",
                "identity": { "match": false, "criticalConflicts": ["brand_mismatch"] },
                "fieldCandidates": [{ "field": "dpi", "method": "network_json" }],
            }]),
            json!({ "missingRequiredFields": ["dpi"] }),
        );
        let queue = build_hypothesis_queue(&run, &SourceIntel::default(), &HypothesisConfig::default());
        assert!(queue[0].suggestions.is_empty());
    }

    #[test]
    fn flatten_dedupes_and_limits() {
        let suggestion = |url: &str, score: f64| HypothesisSuggestion {
            url: url.to_string(),
            root_domain: String::new(),
            source_type: SourceType::Endpoint,
            score,
            reason: REASON_ENDPOINT_HINT.to_string(),
            reasons: BTreeSet::new(),
        };
        let queue = vec![
            HypothesisQueueEntry {
                field: "dpi".into(),
                critical: true,
                priority: 4.0,
                suggestions: vec![suggestion("https://a.com/", 2.0), suggestion("https://b.com/", 1.0)],
            },
            HypothesisQueueEntry {
                field: "weight".into(),
                critical: false,
                priority: 2.0,
                suggestions: vec![suggestion("https://b.com/", 3.0)],
            },
        ];
        let all = next_best_urls_from_hypotheses(&queue, None, 10);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].url, "https://b.com/");
        assert_eq!(all[0].fields.len(), 2);

        let dpi = next_best_urls_from_hypotheses(&queue, Some("dpi"), 1);
        assert_eq!(dpi.len(), 1);
        assert_eq!(dpi[0].url, "https://a.com/");
    }
}
