//! Source promotion: auto-approve consistently good domains into quarantine.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specbrain_core::config::PromotionConfig;
use specbrain_core::constants::QUARANTINE_TIER;
use specbrain_core::types::lenient;
use specbrain_core::values;

use crate::artifact::{impl_brain_artifact, ArtifactMeta};

/// Allow-list overrides read by the pipeline on its next run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOverrides {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    /// Tier name -> approved root domains.
    pub approved: BTreeMap<String, BTreeSet<String>>,
    pub denylist: BTreeSet<String>,
}

impl_brain_artifact!(SourceOverrides, "source_overrides");

impl SourceOverrides {
    pub fn is_approved(&self, domain: &str) -> bool {
        self.approved.values().any(|d| d.contains(domain))
    }

    pub fn is_denied(&self, domain: &str) -> bool {
        self.denylist.contains(domain)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionEntry {
    pub domain: String,
    pub tier: String,
    pub promoted_at: DateTime<Utc>,
    pub reason: String,
}

/// Promotions in the order they happened, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionLog {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub entries: Vec<PromotionEntry>,
}

impl_brain_artifact!(PromotionLog, "source_promotions");

impl PromotionLog {
    pub fn recent(&self, limit: usize) -> Vec<&PromotionEntry> {
        self.entries.iter().rev().take(limit).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionSuggestion {
    #[serde(deserialize_with = "lenient::string_or_empty")]
    pub domain: String,
    #[serde(deserialize_with = "lenient::u64_or_zero")]
    pub attempts: u64,
    #[serde(alias = "identityMatchRate", deserialize_with = "lenient::f64_or_zero")]
    pub identity_match_rate: f64,
    #[serde(alias = "majorConflictRate", deserialize_with = "lenient::f64_or_zero")]
    pub major_conflict_rate: f64,
    #[serde(alias = "fieldYieldRate", deserialize_with = "lenient::f64_or_zero")]
    pub field_yield_rate: f64,
}

impl PromotionSuggestion {
    fn qualifies(&self, config: &PromotionConfig) -> bool {
        self.attempts >= config.effective_min_attempts()
            && values::ratio_or_percent(self.identity_match_rate) >= config.effective_min_identity_match_rate()
            && values::ratio_or_percent(self.major_conflict_rate) <= config.effective_max_major_conflict_rate()
            && values::ratio_or_percent(self.field_yield_rate) >= config.effective_min_field_yield_rate()
    }

    fn reason(&self) -> String {
        format!(
            "attempts={} identity_match_rate={:.2} major_conflict_rate={:.2} field_yield_rate={:.2}",
            self.attempts, self.identity_match_rate, self.major_conflict_rate, self.field_yield_rate
        )
    }
}

/// Produced outside the brain; read-only here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionSuggestions {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    #[serde(deserialize_with = "lenient::skip_invalid")]
    pub suggestions: Vec<PromotionSuggestion>,
}

impl_brain_artifact!(PromotionSuggestions, "promotion_suggestions");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionOutcome {
    pub overrides: SourceOverrides,
    pub log: PromotionLog,
    pub promoted: Vec<String>,
}

/// Promote qualifying suggested domains into the quarantine tier. Domains
/// already approved under any tier or denylisted are skipped, so applying the
/// same suggestions twice promotes nothing the second time.
pub fn apply_promotions(
    mut overrides: SourceOverrides,
    mut log: PromotionLog,
    suggestions: &PromotionSuggestions,
    config: &PromotionConfig,
    now: DateTime<Utc>,
    max_log: usize,
) -> PromotionOutcome {
    let mut promoted = Vec::new();
    if config.effective_enabled() {
        for suggestion in &suggestions.suggestions {
            let domain = values::root_domain(&values::host_of(&suggestion.domain));
            if domain.is_empty() || overrides.is_approved(&domain) || overrides.is_denied(&domain) {
                continue;
            }
            if !suggestion.qualifies(config) {
                continue;
            }
            overrides
                .approved
                .entry(QUARANTINE_TIER.to_string())
                .or_default()
                .insert(domain.clone());
            log.entries.push(PromotionEntry {
                domain: domain.clone(),
                tier: QUARANTINE_TIER.to_string(),
                promoted_at: now,
                reason: suggestion.reason(),
            });
            tracing::info!(%domain, "promoted source domain into quarantine");
            promoted.push(domain);
        }
    }
    if log.entries.len() > max_log {
        let excess = log.entries.len() - max_log;
        log.entries.drain(..excess);
    }
    PromotionOutcome {
        overrides,
        log,
        promoted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn suggestions() -> PromotionSuggestions {
        serde_json::from_value(json!({
            "suggestions": [
                { "domain": "www.rtings.com", "attempts": 12, "identityMatchRate": 0.95, "majorConflictRate": 0.0, "fieldYieldRate": 0.6 },
                { "domain": "spam.com", "attempts": 50, "identity_match_rate": 0.2, "major_conflict_rate": 0.3, "field_yield_rate": 0.1 },
                { "domain": "razer.com", "attempts": "9", "identity_match_rate": "0.9", "major_conflict_rate": 0, "field_yield_rate": 0.5 },
                { "domain": "bad.com", "attempts": 20, "identity_match_rate": 1.0, "major_conflict_rate": 0, "field_yield_rate": 1.0 },
                "not an object",
            ],
        }))
        .unwrap()
    }

    fn overrides() -> SourceOverrides {
        let mut o = SourceOverrides::default();
        o.approved.entry("1".into()).or_default().insert("razer.com".into());
        o.denylist.insert("bad.com".into());
        o
    }

    #[test]
    fn promotes_only_qualifying_unknown_domains() {
        let out = apply_promotions(
            overrides(),
            PromotionLog::default(),
            &suggestions(),
            &PromotionConfig::default(),
            Utc::now(),
            200,
        );
        assert_eq!(out.promoted, vec!["rtings.com"]);
        assert!(out.overrides.approved[QUARANTINE_TIER].contains("rtings.com"));
        assert_eq!(out.log.entries.len(), 1);
        assert_eq!(suggestions().suggestions.len(), 4);
    }

    #[test]
    fn promotion_is_idempotent() {
        let cfg = PromotionConfig::default();
        let first = apply_promotions(overrides(), PromotionLog::default(), &suggestions(), &cfg, Utc::now(), 200);
        let second = apply_promotions(first.overrides.clone(), first.log.clone(), &suggestions(), &cfg, Utc::now(), 200);
        assert!(second.promoted.is_empty());
        assert_eq!(second.overrides, first.overrides);
        assert_eq!(second.log.entries.len(), 1);
    }

    #[test]
    fn disabled_promotion_changes_nothing() {
        let cfg = PromotionConfig {
            enabled: Some(false),
            ..Default::default()
        };
        let out = apply_promotions(overrides(), PromotionLog::default(), &suggestions(), &cfg, Utc::now(), 200);
        assert!(out.promoted.is_empty());
        assert_eq!(out.overrides, overrides());
    }

    #[test]
    fn log_drops_oldest_beyond_cap() {
        let mut log = PromotionLog::default();
        for i in 0..5 {
            log.entries.push(PromotionEntry {
                domain: format!("d{i}.com"),
                tier: QUARANTINE_TIER.into(),
                promoted_at: Utc::now(),
                reason: String::new(),
            });
        }
        let out = apply_promotions(
            SourceOverrides::default(),
            log,
            &PromotionSuggestions::default(),
            &PromotionConfig::default(),
            Utc::now(),
            3,
        );
        assert_eq!(out.log.entries.len(), 3);
        assert_eq!(out.log.entries[0].domain, "d2.com");
        assert_eq!(out.log.recent(1)[0].domain, "d4.com");
    }
}
