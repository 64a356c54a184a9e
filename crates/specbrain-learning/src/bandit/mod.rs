//! Beta-Bernoulli bandit ranking of candidate batches (URLs, fields, queries).

pub mod arm;
pub mod sampler;
pub mod scheduler;

pub use arm::{BanditArm, BanditCandidate};
pub use sampler::{HashNormalSampler, SeededSampler};
pub use scheduler::{
    rank_batch_with_bandit, rank_batch_with_sampler, rank_values, ranked_keys, RankedCandidate,
};
