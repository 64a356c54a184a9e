//! Stable error codes shared by every subsystem error.

/// Implemented by every specbrain error to expose a stable, matchable code.
pub trait BrainErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const STORAGE_UNAVAILABLE: &str = "STORAGE_UNAVAILABLE";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const ARTIFACT_IO: &str = "ARTIFACT_IO";
pub const ARTIFACT_PARSE: &str = "ARTIFACT_PARSE";
pub const ARTIFACT_LOCK: &str = "ARTIFACT_LOCK";
pub const DUPLICATE_KEY: &str = "DUPLICATE_KEY";
