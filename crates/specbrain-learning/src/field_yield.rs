//! Per-domain field yield: how often a domain offers a field and how often
//! the accepted value cites it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use specbrain_core::types::RunOutcome;
use specbrain_core::values;

use crate::artifact::{impl_brain_artifact, ArtifactMeta};

pub const MAX_YIELD_DOMAINS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldYieldCounts {
    pub seen: u64,
    pub used: u64,
}

impl FieldYieldCounts {
    pub fn yield_ratio(&self) -> f64 {
        if self.seen == 0 {
            0.0
        } else {
            self.used.min(self.seen) as f64 / self.seen as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainYield {
    pub attempts: u64,
    pub identity_matches: u64,
    pub fields: BTreeMap<String, FieldYieldCounts>,
}

impl DomainYield {
    pub fn totals(&self) -> FieldYieldCounts {
        self.fields.values().fold(FieldYieldCounts::default(), |acc, c| FieldYieldCounts {
            seen: acc.seen + c.seen,
            used: acc.used + c.used,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldYield {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub domains: BTreeMap<String, DomainYield>,
}

impl_brain_artifact!(FieldYield, "field_yield");

/// Seen/used increments of one (domain, field) pair in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldDelta {
    pub domain: String,
    pub field: String,
    pub seen_delta: u64,
    pub used_delta: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopYieldDomain {
    pub domain: String,
    pub attempts: u64,
    pub seen: u64,
    pub used: u64,
    pub yield_ratio: f64,
}

/// Per (domain, field): seen when the domain offered a candidate, used when
/// the accepted provenance cites the domain. A cited domain always counts as seen.
pub fn compute_yield_deltas(run: &RunOutcome) -> Vec<YieldDelta> {
    let mut pairs: BTreeMap<(String, String), (bool, bool)> = BTreeMap::new();
    for source in &run.source_results {
        let domain = source.effective_root_domain();
        if domain.is_empty() {
            continue;
        }
        for candidate in &source.field_candidates {
            let field = candidate.field.trim();
            if !field.is_empty() {
                pairs.entry((domain.clone(), field.to_string())).or_default().0 = true;
            }
        }
    }
    for (field, provenance) in &run.provenance {
        if !values::is_known_value(&provenance.value) {
            continue;
        }
        let cited: BTreeSet<String> = provenance
            .evidence
            .iter()
            .map(|e| e.effective_root_domain())
            .filter(|d| !d.is_empty())
            .collect();
        for domain in cited {
            let entry = pairs.entry((domain, field.clone())).or_default();
            entry.0 = true;
            entry.1 = true;
        }
    }
    pairs
        .into_iter()
        .map(|((domain, field), (seen, used))| YieldDelta {
            domain,
            field,
            seen_delta: u64::from(seen),
            used_delta: u64::from(used),
        })
        .collect()
}

pub fn update_field_yield(mut artifact: FieldYield, run: &RunOutcome, deltas: &[YieldDelta]) -> FieldYield {
    let mut attempted: BTreeMap<String, bool> = BTreeMap::new();
    for source in &run.source_results {
        let domain = source.effective_root_domain();
        if !domain.is_empty() {
            *attempted.entry(domain).or_default() |= source.identity.matched;
        }
    }
    for (domain, matched) in attempted {
        let entry = artifact.domains.entry(domain).or_default();
        entry.attempts += 1;
        entry.identity_matches += u64::from(matched);
    }
    for delta in deltas {
        let counts = artifact
            .domains
            .entry(delta.domain.clone())
            .or_default()
            .fields
            .entry(delta.field.clone())
            .or_default();
        counts.seen += delta.seen_delta;
        counts.used += delta.used_delta;
    }

    if artifact.domains.len() > MAX_YIELD_DOMAINS {
        let mut ranked: Vec<(String, DomainYield)> = std::mem::take(&mut artifact.domains).into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.attempts
                .cmp(&a.1.attempts)
                .then_with(|| b.1.totals().used.cmp(&a.1.totals().used))
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(MAX_YIELD_DOMAINS);
        artifact.domains = ranked.into_iter().collect();
    }
    artifact
}

/// Domains whose citations were most often used, best first.
pub fn top_yield_domains(artifact: &FieldYield, limit: usize) -> Vec<TopYieldDomain> {
    let mut out: Vec<TopYieldDomain> = artifact
        .domains
        .iter()
        .map(|(domain, d)| {
            let totals = d.totals();
            TopYieldDomain {
                domain: domain.clone(),
                attempts: d.attempts,
                seen: totals.seen,
                used: totals.used,
                yield_ratio: totals.yield_ratio(),
            }
        })
        .filter(|d| d.used > 0)
        .collect();
    out.sort_by(|a, b| {
        b.used
            .cmp(&a.used)
            .then_with(|| b.yield_ratio.total_cmp(&a.yield_ratio))
            .then_with(|| a.domain.cmp(&b.domain))
    });
    out.truncate(limit);
    out
}
