//! Candidate rows and the Beta arm derived from each.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use specbrain_core::values;

/// One rankable candidate as described by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BanditCandidate {
    pub key: String,
    pub confidence: f64,
    pub validated: bool,
    pub contradiction_count: u64,
    pub missing_critical_count: u64,
    pub has_history: bool,
    pub below_target_count: u64,
    pub queued_hypotheses: u64,
    pub brand: Option<String>,
    pub pull_count: u64,
}

impl BanditCandidate {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Read a loosely-typed metadata row. Rows without a non-empty key yield `None`;
    /// malformed numbers coerce to 0.
    pub fn from_value(row: &Value) -> Option<Self> {
        let obj = row.as_object()?;
        let key = values::value_text(field(obj, &["key", "id", "url"])?);
        if key.is_empty() {
            return None;
        }
        let num = |names: &[&str]| field(obj, names).and_then(values::safe_f64).unwrap_or(0.0);
        let count = |names: &[&str]| field(obj, names).and_then(values::safe_u64).unwrap_or(0);
        let flag = |names: &[&str]| field(obj, names).is_some_and(values::safe_bool);
        let brand = field(obj, &["brand"])
            .map(values::value_text)
            .filter(|b| !b.is_empty());

        Some(Self {
            key,
            confidence: values::clamp01(num(&["confidence"])),
            validated: flag(&["validated"]),
            contradiction_count: count(&["contradictionCount", "contradiction_count"]),
            missing_critical_count: count(&["missingCriticalCount", "missing_critical_count"]),
            has_history: flag(&["hasHistory", "has_history"]),
            below_target_count: count(&["belowTargetCount", "below_target_count"]),
            queued_hypotheses: count(&["queuedHypotheses", "queued_hypotheses"]),
            brand,
            pull_count: count(&["pullCount", "pull_count"]),
        })
    }
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| obj.get(*n)).filter(|v| !v.is_null())
}

/// Beta posterior pseudo-counts plus the urgency prior of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BanditArm {
    pub alpha: f64,
    pub beta: f64,
    pub pull_count: u64,
    /// Urgency in [0, 2].
    pub info_need: f64,
}

impl BanditArm {
    /// Derive the arm of a candidate given its brand reward (positive helps, negative hurts).
    pub fn from_candidate(candidate: &BanditCandidate, brand_reward: f64) -> Self {
        let confidence = values::clamp01(candidate.confidence);
        let reward = if brand_reward.is_finite() { brand_reward } else { 0.0 };

        let success = if candidate.validated { 2.0 } else { 0.0 }
            + 2.0 * confidence
            + 1.5 * reward.max(0.0);
        let failure = 1.5 * (1.0 - confidence)
            + 0.75 * candidate.contradiction_count as f64
            + 0.5 * candidate.missing_critical_count as f64
            + 1.5 * (-reward).max(0.0);

        Self {
            alpha: 1.0 + success,
            beta: 1.0 + failure,
            pull_count: candidate.pull_count.max(1),
            info_need: info_need(candidate),
        }
    }

    pub fn mean(&self) -> f64 {
        let sum = self.alpha + self.beta;
        if sum <= 0.0 || !sum.is_finite() {
            return 0.5;
        }
        (self.alpha / sum).clamp(0.0, 1.0)
    }

    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        let denom = sum * sum * (sum + 1.0);
        if denom <= 0.0 || !denom.is_finite() {
            return 0.25;
        }
        ((self.alpha * self.beta) / denom).max(0.0)
    }
}

/// Urgency of looking at a candidate, capped at 2.
pub fn info_need(candidate: &BanditCandidate) -> f64 {
    let raw = 0.35 * candidate.missing_critical_count as f64
        + 0.15 * candidate.below_target_count as f64
        + 0.20 * candidate.contradiction_count as f64
        + 0.10 * candidate.queued_hypotheses as f64
        + if candidate.has_history { 0.0 } else { 0.4 };
    raw.min(2.0)
}
