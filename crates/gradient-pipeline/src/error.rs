//! Stage execution error types.
//!
//! The taxonomy the host sees: configuration errors are fatal to the
//! stage and never retried internally; platform errors pass through
//! unchanged so the host owns retry policy; readiness failures carry the
//! platform's message verbatim.

use thiserror::Error;

use gradient_core::manifest::ManifestError;
use gradient_platform::PlatformError;
use gradient_revision::RevisionError;
use gradient_traffic::TrafficError;

/// Result type alias for stage execution.
pub type StageResult<T> = Result<T, StageError>;

/// Errors surfaced by stage execution.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported stage: {0}")]
    UnsupportedStage(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("service failed to become ready: {0}")]
    ReadinessFailed(String),

    #[error("stage cancelled")]
    Cancelled,

    #[error(transparent)]
    Traffic(#[from] TrafficError),

    #[error(transparent)]
    Revision(#[from] RevisionError),
}

impl StageError {
    /// Whether this is a configuration error (bad stage parameters or
    /// unresolvable coordinates) as opposed to a platform-side failure.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            StageError::Config(_)
                | StageError::UnsupportedStage(_)
                | StageError::Traffic(TrafficError::InvalidPercent(_))
        )
    }
}
