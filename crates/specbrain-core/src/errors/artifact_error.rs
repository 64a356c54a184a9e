//! Errors from the JSON artifact document store.

use super::error_code::{self, BrainErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact I/O failed at {path}: {message}")]
    Io { path: String, message: String },

    #[error("artifact {kind} could not be decoded: {message}")]
    Parse { kind: String, message: String },

    #[error("artifact {kind} could not be encoded: {message}")]
    Serialize { kind: String, message: String },

    #[error("artifact lock failed at {path}: {message}")]
    Lock { path: String, message: String },
}

impl BrainErrorCode for ArtifactError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::ARTIFACT_IO,
            Self::Parse { .. } | Self::Serialize { .. } => error_code::ARTIFACT_PARSE,
            Self::Lock { .. } => error_code::ARTIFACT_LOCK,
        }
    }
}
