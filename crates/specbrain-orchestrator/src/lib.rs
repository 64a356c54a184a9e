//! # specbrain-orchestrator
//!
//! The per-category brain. Loads every learner artifact (primary store
//! first, JSON documents as fallback), folds one run outcome into them,
//! writes gated facts into the decay-aware memory tables, and persists the
//! result according to the configured persist mode.

pub mod brain;
pub mod degradation;
pub mod engine;
pub mod report;
mod update;

pub use brain::CategoryBrain;
pub use degradation::{DegradationEvent, DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use engine::BrainOrchestrator;
pub use report::BrainReport;
pub use update::UpdateReport;
