//! "What's missing" to "where to look next": per-field URL suggestions.

pub mod builder;
pub mod scoring;
pub mod source_intel;

pub use builder::{
    build_hypothesis_queue, next_best_urls_from_hypotheses, HypothesisQueueEntry, HypothesisSuggestion,
    RankedUrl, SourceType,
};
pub use source_intel::{DomainIntel, SourceIntel};
