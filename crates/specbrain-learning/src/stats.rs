//! Rolling per-category run statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specbrain_core::types::RunOutcome;

use crate::artifact::{impl_brain_artifact, ArtifactMeta};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainStats {
    #[serde(flatten)]
    pub meta: ArtifactMeta,
    pub runs_total: u64,
    pub validated_runs: u64,
    pub validation_rate: f64,
    pub avg_confidence: f64,
    pub avg_completeness: f64,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl_brain_artifact!(BrainStats, "stats");

/// Fold one run into the averages incrementally; prior runs are never re-read.
pub fn update_stats(mut stats: BrainStats, run: &RunOutcome, now: DateTime<Utc>) -> BrainStats {
    stats.runs_total += 1;
    let n = stats.runs_total as f64;
    let validated = if run.summary.validated { 1.0 } else { 0.0 };
    stats.validated_runs += u64::from(run.summary.validated);
    stats.validation_rate += (validated - stats.validation_rate) / n;
    stats.avg_confidence += (run.summary.confidence_ratio() - stats.avg_confidence) / n;
    stats.avg_completeness += (run.summary.completeness_ratio() - stats.avg_completeness) / n;
    stats.last_run_at = Some(now);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(validated: bool, confidence: f64, completeness: f64) -> RunOutcome {
        serde_json::from_value(json!({
            "summary": { "validated": validated, "confidence": confidence, "completenessRequired": completeness },
        }))
        .unwrap()
    }

    #[test]
    fn incremental_averages_match_batch_means() {
        let now = Utc::now();
        let mut s = BrainStats::default();
        s = update_stats(s, &run(true, 0.9, 100.0), now);
        s = update_stats(s, &run(false, 0.5, 0.5), now);
        s = update_stats(s, &run(true, 0.7, 0.6), now);
        assert_eq!(s.runs_total, 3);
        assert_eq!(s.validated_runs, 2);
        assert!((s.validation_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((s.avg_confidence - 0.7).abs() < 1e-9);
        assert!((s.avg_completeness - 0.7).abs() < 1e-9);
        assert_eq!(s.last_run_at, Some(now));
    }
}
