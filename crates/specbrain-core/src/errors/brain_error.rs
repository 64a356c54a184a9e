//! Top-level error aggregating subsystem errors via `From` conversions.

use super::error_code::BrainErrorCode;
use super::{ArtifactError, ConfigError, SchedulerError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl BrainErrorCode for BrainError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Artifact(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Scheduler(e) => e.error_code(),
        }
    }
}

pub type BrainResult<T> = Result<T, BrainError>;
