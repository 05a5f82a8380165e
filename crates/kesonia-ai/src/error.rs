use std::path::PathBuf;

use kesonia_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("model artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("invalid model artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl PipelineError {
    /// Whether the failure was caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
