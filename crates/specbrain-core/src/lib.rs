//! # specbrain-core
//!
//! Foundation crate for the specbrain learning core.
//! Defines the run-outcome types consumed from the extraction pipeline,
//! shared value helpers, configuration, errors, and tracing setup.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing_setup;
pub mod types;
pub mod values;

// Re-export the most commonly used types at the crate root.
pub use config::BrainConfig;
pub use errors::{BrainError, BrainErrorCode};
pub use types::RunOutcome;
