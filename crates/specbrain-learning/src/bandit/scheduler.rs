//! Blended Thompson/UCB/info-need ranking of one candidate batch.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use specbrain_core::config::BanditMode;
use specbrain_core::errors::SchedulerError;
use specbrain_core::values;

use super::arm::{BanditArm, BanditCandidate};
use super::sampler::{HashNormalSampler, SeededSampler};

/// A candidate with its arm and score components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub key: String,
    pub score: f64,
    pub thompson: f64,
    pub ucb: f64,
    pub info_need: f64,
    pub arm: BanditArm,
}

/// Rank with the default hash-based sampler.
pub fn rank_batch_with_bandit(
    candidates: &[BanditCandidate],
    brand_rewards: &BTreeMap<String, f64>,
    mode: BanditMode,
    seed: &str,
) -> Result<Vec<RankedCandidate>, SchedulerError> {
    rank_batch_with_sampler(candidates, brand_rewards, mode, seed, &HashNormalSampler::new())
}

/// Rank a batch of candidates. Output is sorted by blended score descending,
/// ties broken by key ascending. Candidates with a blank key are dropped; a
/// key appearing twice rejects the batch.
pub fn rank_batch_with_sampler(
    candidates: &[BanditCandidate],
    brand_rewards: &BTreeMap<String, f64>,
    mode: BanditMode,
    seed: &str,
    sampler: &dyn SeededSampler,
) -> Result<Vec<RankedCandidate>, SchedulerError> {
    let _span = specbrain_core::ranking_span!(mode.name(), candidates.len()).entered();

    let candidates: Vec<&BanditCandidate> = candidates.iter().filter(|c| !c.key.trim().is_empty()).collect();
    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in &candidates {
        if !seen.insert(candidate.key.as_str()) {
            return Err(SchedulerError::DuplicateKey {
                key: candidate.key.clone(),
            });
        }
    }

    let rewards: BTreeMap<String, f64> = brand_rewards
        .iter()
        .map(|(brand, reward)| (values::normalize_token(brand), *reward))
        .collect();

    let arms: Vec<BanditArm> = candidates
        .iter()
        .map(|c| {
            let reward = c
                .brand
                .as_deref()
                .and_then(|b| rewards.get(&values::normalize_token(b)))
                .copied()
                .unwrap_or(0.0);
            BanditArm::from_candidate(c, reward)
        })
        .collect();

    let total_pulls: u64 = arms.iter().map(|a| a.pull_count).sum();
    let exploration = mode.exploration_base() * ((total_pulls as f64 + 1.0).ln()).sqrt();
    let (w_thompson, w_ucb, w_info) = mode.weights();

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .zip(arms)
        .map(|(candidate, arm)| {
            let mean = arm.mean();
            let z = sampler.standard_normal(seed, &candidate.key);
            let thompson = values::clamp01(mean + z * arm.variance().sqrt());
            let ucb = mean + exploration / (arm.pull_count.max(1) as f64).sqrt();
            let score = w_thompson * thompson + w_ucb * ucb + w_info * (arm.info_need / 2.0);
            RankedCandidate {
                key: candidate.key.clone(),
                score: if score.is_finite() { score } else { 0.0 },
                thompson,
                ucb,
                info_need: arm.info_need,
                arm,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
    tracing::debug!(ranked = ranked.len(), total_pulls, "bandit batch ranked");
    Ok(ranked)
}

/// Rank loosely-typed metadata rows; rows without a usable key are dropped first.
pub fn rank_values(
    rows: &[Value],
    brand_rewards: &BTreeMap<String, f64>,
    mode: BanditMode,
    seed: &str,
) -> Result<Vec<RankedCandidate>, SchedulerError> {
    let candidates: Vec<BanditCandidate> = rows.iter().filter_map(BanditCandidate::from_value).collect();
    if candidates.len() < rows.len() {
        tracing::debug!(dropped = rows.len() - candidates.len(), "dropped keyless candidate rows");
    }
    rank_batch_with_bandit(&candidates, brand_rewards, mode, seed)
}

pub fn ranked_keys(ranked: &[RankedCandidate]) -> Vec<String> {
    ranked.iter().map(|r| r.key.clone()).collect()
}
