//! Traffic controller error types.

use thiserror::Error;

use gradient_platform::PlatformError;

/// Result type alias for traffic operations.
pub type TrafficResult<T> = Result<T, TrafficError>;

/// Errors that can occur while computing or applying traffic splits.
#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("invalid traffic percentage: {0} (must be 0-100)")]
    InvalidPercent(i64),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
