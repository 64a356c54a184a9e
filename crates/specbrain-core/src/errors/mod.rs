//! Error handling for specbrain.
//! One error enum per subsystem, `thiserror` only.

pub mod artifact_error;
pub mod brain_error;
pub mod config_error;
pub mod error_code;
pub mod scheduler_error;
pub mod storage_error;

pub use artifact_error::ArtifactError;
pub use brain_error::{BrainError, BrainResult};
pub use config_error::ConfigError;
pub use error_code::BrainErrorCode;
pub use scheduler_error::SchedulerError;
pub use storage_error::StorageError;
