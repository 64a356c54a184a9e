//! Candidate scheduling errors.

use super::error_code::{self, BrainErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("duplicate candidate key in ranking batch: {key}")]
    DuplicateKey { key: String },
}

impl BrainErrorCode for SchedulerError {
    fn error_code(&self) -> &'static str {
        error_code::DUPLICATE_KEY
    }
}
