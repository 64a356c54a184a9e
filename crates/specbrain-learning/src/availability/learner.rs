//! Availability counters, updated from validated runs only.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use specbrain_core::config::AvailabilityThresholds;
use specbrain_core::constants::NOT_PUBLICLY_DISCLOSED;
use specbrain_core::types::RunOutcome;
use specbrain_core::values;

use super::classify::{classify, filled_rate, AvailabilityClass};
use crate::artifact::{impl_brain_artifact, truncate_counts, ArtifactMeta};

const MAX_DOMAIN_STATS: usize = 60;
const MAX_UNKNOWN_REASONS: usize = 24;
const UNSPECIFIED_REASON: &str = "unspecified";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainFillStats {
    pub seen: u64,
    pub filled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAvailabilityRow {
    pub validated_seen: u64,
    pub validated_filled: u64,
    pub filled_rate_validated: f64,
    pub classification: AvailabilityClass,
    pub unknown_reason_counts: BTreeMap<String, u64>,
    pub domain_stats: BTreeMap<String, DomainFillStats>,
    pub top_domains: Vec<String>,
}

impl FieldAvailabilityRow {
    pub fn unknown_count(&self) -> u64 {
        self.validated_seen.saturating_sub(self.validated_filled)
    }

    pub fn undisclosed_count(&self) -> u64 {
        self.unknown_reason_counts
            .get(NOT_PUBLICLY_DISCLOSED)
            .copied()
            .unwrap_or(0)
    }

    fn reclassify(&mut self, thresholds: &AvailabilityThresholds) {
        self.filled_rate_validated = filled_rate(self.validated_seen, self.validated_filled);
        self.classification = classify(
            self.validated_seen,
            self.validated_filled,
            self.undisclosed_count(),
            thresholds,
        );
    }

    fn cap_domains(&mut self, max_top_domains: usize) {
        let mut ranked: Vec<(String, DomainFillStats)> =
            std::mem::take(&mut self.domain_stats).into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.filled
                .cmp(&a.1.filled)
                .then_with(|| b.1.seen.cmp(&a.1.seen))
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(MAX_DOMAIN_STATS);
        self.top_domains = ranked
            .iter()
            .filter(|(_, s)| s.filled > 0)
            .take(max_top_domains)
            .map(|(d, _)| d.clone())
            .collect();
        self.domain_stats = ranked.into_iter().collect();
    }
}

/// Field -> availability row for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAvailability {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub fields: BTreeMap<String, FieldAvailabilityRow>,
}

impl_brain_artifact!(FieldAvailability, "field_availability");

impl FieldAvailability {
    pub fn class_of(&self, field: &str) -> AvailabilityClass {
        self.fields
            .get(field)
            .map(|r| r.classification)
            .unwrap_or_default()
    }
}

/// Fold one run into the availability counters. Unvalidated runs leave the
/// artifact unchanged.
pub fn update_field_availability(
    mut artifact: FieldAvailability,
    run: &RunOutcome,
    thresholds: &AvailabilityThresholds,
    max_top_domains: usize,
) -> FieldAvailability {
    if !run.summary.validated {
        return artifact;
    }

    let seen: BTreeSet<&str> = run
        .normalized
        .keys()
        .map(String::as_str)
        .chain(run.summary.missing_required_fields.iter().map(String::as_str))
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    for field in seen {
        let filled = run.normalized.get(field).is_some_and(values::is_known_value);
        let row = artifact.fields.entry(field.to_string()).or_default();
        row.validated_seen += 1;
        if filled {
            row.validated_filled += 1;
        } else {
            let reason = run
                .summary
                .unknown_reason(field)
                .map(values::normalize_token)
                .unwrap_or_else(|| UNSPECIFIED_REASON.to_string());
            *row.unknown_reason_counts.entry(reason).or_default() += 1;
            truncate_counts(&mut row.unknown_reason_counts, MAX_UNKNOWN_REASONS);
        }

        for domain in evidence_domains(run, field) {
            let stats = row.domain_stats.entry(domain).or_default();
            stats.seen += 1;
            if filled {
                stats.filled += 1;
            }
        }
        row.cap_domains(max_top_domains);
        row.reclassify(thresholds);
    }
    artifact
}

fn evidence_domains(run: &RunOutcome, field: &str) -> BTreeSet<String> {
    run.provenance
        .get(field)
        .map(|p| {
            p.evidence
                .iter()
                .map(|e| e.effective_root_domain())
                .filter(|d| !d.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
