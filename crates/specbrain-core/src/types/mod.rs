//! Run-outcome types consumed from the extraction pipeline.

pub mod lenient;
pub mod run;

pub use run::{
    AnchorCheck, DiscoveryCandidate, DiscoveryResult, EndpointSuggestion, Evidence,
    FieldCandidate, FieldProvenance, FieldReasoning, IdentityCheck, IdentityLock, Job,
    ParserHealth, RunOutcome, RunSummary, SourceResult,
};
