//! # specbrain-learning
//!
//! Pure learners over brain artifacts. Every update takes the prior artifact
//! by value together with one run outcome and returns the updated artifact;
//! nothing here touches storage.

pub mod artifact;
pub mod availability;
pub mod bandit;
pub mod constraints;
pub mod field_yield;
pub mod gate;
pub mod hypothesis;
pub mod lexicon;
pub mod profile;
pub mod promotion;
pub mod queries;
pub mod stats;

pub use artifact::{decode_artifact, encode_artifact, ArtifactMeta, BrainArtifact};
pub use availability::{update_field_availability, AvailabilityClass, FieldAvailability};
pub use bandit::{rank_batch_with_bandit, BanditCandidate, RankedCandidate};
pub use constraints::{update_constraints, FieldConstraints};
pub use field_yield::{compute_yield_deltas, update_field_yield, FieldYield, YieldDelta};
pub use gate::{evaluate_learning_gate, GateDecision, GateInput, GateReason};
pub use hypothesis::{build_hypothesis_queue, next_best_urls_from_hypotheses, HypothesisQueueEntry, SourceIntel};
pub use lexicon::{update_lexicon, FieldLexicon};
pub use profile::{merge_profile, profile_kind, LearningProfile, ProfileUpdate};
pub use promotion::{apply_promotions, PromotionLog, PromotionSuggestions, SourceOverrides};
pub use queries::{update_query_learning, QueryLearning};
pub use stats::{update_stats, BrainStats};
