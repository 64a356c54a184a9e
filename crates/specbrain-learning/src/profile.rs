//! Per-product learning profile, merged run after run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use specbrain_core::constants::{MAX_FEEDBACK_URLS, MAX_PREFERRED_URLS};
use specbrain_core::types::RunOutcome;
use specbrain_core::values;

use crate::artifact::{impl_brain_artifact, ArtifactMeta};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostStat {
    pub host: String,
    pub attempts: u64,
    pub identity_matches: u64,
    pub anchor_conflicts: u64,
    /// Share of offered fields whose accepted value cites this host, averaged over attempts.
    pub yield_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningProfile {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub identity_key: String,
    pub runs_total: u64,
    pub validated_runs: u64,
    pub preferred_urls: Vec<String>,
    pub feedback_urls: Vec<String>,
    pub host_stats: Vec<HostStat>,
    pub unknown_field_rate_avg: f64,
    pub unknown_field_rate_samples: u64,
    pub parser_health_avg: f64,
    pub parser_health_samples: u64,
}

impl_brain_artifact!(LearningProfile, "profile");

/// Storage kind of the profile of one product identity.
pub fn profile_kind(identity_key: &str) -> String {
    format!("profile_{identity_key}")
}

impl LearningProfile {
    pub fn host(&self, host: &str) -> Option<&HostStat> {
        self.host_stats.iter().find(|h| h.host == host)
    }
}

/// What one run contributes to a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub validated: bool,
    /// URLs cited by accepted values.
    pub preferred_urls: Vec<String>,
    /// URLs that failed identity or anchor checks.
    pub feedback_urls: Vec<String>,
    pub host_stats: Vec<HostStat>,
    pub unknown_field_rate: Option<f64>,
    pub parser_health: Option<f64>,
}

impl ProfileUpdate {
    pub fn from_run(run: &RunOutcome) -> Self {
        let mut preferred = Vec::new();
        let mut cited_hosts: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        for (field, provenance) in &run.provenance {
            if !values::is_known_value(&provenance.value) {
                continue;
            }
            for evidence in &provenance.evidence {
                push_unique(&mut preferred, evidence.url.trim());
                let host = evidence.effective_host();
                if !host.is_empty() {
                    cited_hosts.entry(host).or_default().insert(field.as_str());
                }
            }
        }

        let mut feedback = Vec::new();
        let mut hosts: BTreeMap<String, HostStat> = BTreeMap::new();
        let mut offered: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        let mut health = Vec::new();
        for source in &run.source_results {
            if !source.identity.matched || source.has_major_conflicts() {
                push_unique(&mut feedback, source.url.trim());
            }
            if let Some(h) = source.parser_health.health_score.filter(|h| h.is_finite()) {
                health.push(values::clamp01(h));
            }
            let host = source.effective_host();
            if host.is_empty() {
                continue;
            }
            let stat = hosts.entry(host.clone()).or_insert_with(|| HostStat {
                host: host.clone(),
                ..Default::default()
            });
            stat.attempts += 1;
            stat.identity_matches += u64::from(source.identity.matched);
            stat.anchor_conflicts += source.anchor_check.major_conflicts.len() as u64;
            offered
                .entry(host)
                .or_default()
                .extend(source.field_candidates.iter().map(|c| c.field.trim()).filter(|f| !f.is_empty()));
        }
        for (host, stat) in hosts.iter_mut() {
            let offered_fields = offered.get(host);
            let used = match (offered_fields, cited_hosts.get(host)) {
                (Some(o), Some(c)) => o.intersection(c).count(),
                _ => 0,
            };
            let offered_count = offered_fields.map_or(0, BTreeSet::len);
            stat.yield_score = if offered_count == 0 {
                0.0
            } else {
                used as f64 / offered_count as f64
            };
        }

        let unknown_field_rate = (!run.normalized.is_empty()).then(|| {
            let unknown = run.normalized.values().filter(|v| !values::is_known_value(v)).count();
            unknown as f64 / run.normalized.len() as f64
        });
        let parser_health = (!health.is_empty()).then(|| health.iter().sum::<f64>() / health.len() as f64);

        Self {
            validated: run.summary.validated,
            preferred_urls: preferred,
            feedback_urls: feedback,
            host_stats: hosts.into_values().collect(),
            unknown_field_rate,
            parser_health,
        }
    }
}

fn push_unique(list: &mut Vec<String>, url: &str) {
    if !url.is_empty() && !list.iter().any(|u| u == url) {
        list.push(url.to_string());
    }
}

/// Newest first, deduplicated, capped.
fn merge_urls(existing: &[String], fresh: &[String], cap: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(cap);
    for url in fresh.iter().chain(existing) {
        if out.len() >= cap {
            break;
        }
        push_unique(&mut out, url);
    }
    out
}

fn running_avg(avg: f64, samples: u64, sample: f64) -> f64 {
    let n = samples + 1;
    avg + (sample - avg) / n as f64
}

/// Merge one run into a profile. Hosts are never dropped, and an update
/// with zero attempts for a host leaves that host's stats untouched.
pub fn merge_profile(mut profile: LearningProfile, identity_key: &str, update: &ProfileUpdate) -> LearningProfile {
    if profile.identity_key.is_empty() {
        profile.identity_key = identity_key.to_string();
    }
    profile.runs_total += 1;
    profile.validated_runs += u64::from(update.validated);
    profile.preferred_urls = merge_urls(&profile.preferred_urls, &update.preferred_urls, MAX_PREFERRED_URLS);
    profile.feedback_urls = merge_urls(&profile.feedback_urls, &update.feedback_urls, MAX_FEEDBACK_URLS);

    for fresh in &update.host_stats {
        if fresh.attempts == 0 {
            continue;
        }
        match profile.host_stats.iter_mut().find(|h| h.host == fresh.host) {
            Some(existing) => {
                let total = existing.attempts + fresh.attempts;
                existing.yield_score = (existing.yield_score * existing.attempts as f64
                    + fresh.yield_score * fresh.attempts as f64)
                    / total as f64;
                existing.attempts = total;
                existing.identity_matches += fresh.identity_matches;
                existing.anchor_conflicts += fresh.anchor_conflicts;
            }
            None => profile.host_stats.push(fresh.clone()),
        }
    }
    profile
        .host_stats
        .sort_by(|a, b| b.attempts.cmp(&a.attempts).then_with(|| a.host.cmp(&b.host)));

    if let Some(rate) = update.unknown_field_rate.filter(|r| r.is_finite()) {
        profile.unknown_field_rate_avg =
            running_avg(profile.unknown_field_rate_avg, profile.unknown_field_rate_samples, rate);
        profile.unknown_field_rate_samples += 1;
    }
    if let Some(health) = update.parser_health.filter(|h| h.is_finite()) {
        profile.parser_health_avg = running_avg(profile.parser_health_avg, profile.parser_health_samples, health);
        profile.parser_health_samples += 1;
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run() -> RunOutcome {
        serde_json::from_value(json!({
            "job": { "productId": "mouse-razer-viper" },
            "summary": { "validated": true },
            "normalized": { "dpi": 26000, "weight": "unk" },
            "provenance": {
                "dpi": { "value": 26000, "evidence": [{ "url": "https://razer.com/viper" }] },
            },
            "sourceResults": [
                {
                    "url": "https://razer.com/viper",
                    "identity": { "match": true },
                    "parserHealth": { "healthScore": 0.9 },
                    "fieldCandidates": [{ "field": "dpi" }, { "field": "weight" }],
                },
                {
                    "url": "https://fake.com/p",
                    "identity": { "match": false },
                    "parserHealth": { "healthScore": 0.5 },
                },
            ],
        }))
        .unwrap()
    }

    #[test]
    fn update_from_run() {
        let u = ProfileUpdate::from_run(&run());
        assert_eq!(u.preferred_urls, vec!["https://razer.com/viper"]);
        assert_eq!(u.feedback_urls, vec!["https://fake.com/p"]);
        assert_eq!(u.unknown_field_rate, Some(0.5));
        assert!((u.parser_health.unwrap() - 0.7).abs() < 1e-9);
        let razer = u.host_stats.iter().find(|h| h.host == "razer.com").unwrap();
        assert_eq!(razer.yield_score, 0.5);
    }

    #[test]
    fn merge_accumulates_and_keeps_hosts() {
        let r = run();
        let key = r.job.identity_key();
        let u = ProfileUpdate::from_run(&r);
        let p = merge_profile(LearningProfile::default(), &key, &u);
        let p = merge_profile(p, &key, &ProfileUpdate::default());
        assert_eq!(p.identity_key, "mouse-razer-viper");
        assert_eq!(p.runs_total, 2);
        assert_eq!(p.validated_runs, 1);
        assert_eq!(p.host_stats.len(), 2);
        assert_eq!(p.host("razer.com").unwrap().attempts, 1);
        assert_eq!(p.unknown_field_rate_samples, 1);
        assert_eq!(profile_kind(&key), "profile_mouse-razer-viper");
    }

    #[test]
    fn zero_attempt_merge_leaves_host_unchanged() {
        let u = ProfileUpdate::from_run(&run());
        let p = merge_profile(LearningProfile::default(), "k", &u);
        let before = p.host("razer.com").cloned().unwrap();
        let empty = ProfileUpdate {
            host_stats: vec![HostStat {
                host: "razer.com".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let p = merge_profile(p, "k", &empty);
        assert_eq!(p.host("razer.com"), Some(&before));
    }

    #[test]
    fn url_lists_newest_first_and_capped() {
        let existing: Vec<String> = (0..MAX_PREFERRED_URLS).map(|i| format!("https://old/{i}")).collect();
        let merged = merge_urls(&existing, &["https://new".to_string(), "https://old/0".to_string()], MAX_PREFERRED_URLS);
        assert_eq!(merged.len(), MAX_PREFERRED_URLS);
        assert_eq!(merged[0], "https://new");
        assert_eq!(merged[1], "https://old/0");
    }
}
