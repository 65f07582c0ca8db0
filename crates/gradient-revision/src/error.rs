//! Revision lifecycle error types.

use thiserror::Error;

use gradient_platform::PlatformError;

/// Result type alias for revision lifecycle operations.
pub type RevisionResult<T> = Result<T, RevisionError>;

/// Errors that can occur during revision lifecycle operations.
#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("no revisions found for service {0}")]
    NoRevisions(String),

    #[error("no previous revision found for service {0}")]
    NoPrevious(String),

    #[error("failed to delete revision {revision}: {source}")]
    Delete {
        revision: String,
        source: PlatformError,
    },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
