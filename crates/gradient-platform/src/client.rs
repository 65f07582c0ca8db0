//! The compute-platform capability interface.
//!
//! Everything the engine needs from the platform's control API, expressed
//! as one trait. Production traffic goes through [`crate::http::HttpClient`];
//! tests run against [`crate::fake::FakePlatform`]. Every operation is a
//! single round trip with no internal retry, so callers can retry whole
//! stages safely.

use thiserror::Error;

use gradient_core::types::{Revision, Service, ServiceRef, TrafficTarget};

/// Result type alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors surfaced by the platform client.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceRef),

    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("api error: status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("service failed to become ready: {0}")]
    NotReady(String),

    #[error("timed out after {0}s waiting for service to become ready")]
    ReadyTimeout(u64),

    #[error("traffic allocation rejected: {0}")]
    InvalidAllocation(String),
}

impl PlatformError {
    /// Whether this error means the requested entity does not exist.
    /// The sync and preview paths branch on this to take the create path.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PlatformError::ServiceNotFound(_) | PlatformError::RevisionNotFound(_)
        )
    }
}

/// Client capability contract against the compute platform's control API.
///
/// `create_or_update_service` is a single idempotent upsert; applying a
/// template always yields exactly one new platform-named revision.
/// `wait_for_service_ready` blocks until the service reports a terminal
/// `Ready` condition and fails with [`PlatformError::NotReady`] when that
/// condition is `Failed`.
#[allow(async_fn_in_trait)]
pub trait PlatformClient: Send + Sync {
    async fn get_service(&self, svc: &ServiceRef) -> PlatformResult<Service>;

    async fn create_or_update_service(
        &self,
        svc: &ServiceRef,
        desired: &Service,
    ) -> PlatformResult<Service>;

    async fn update_traffic(
        &self,
        svc: &ServiceRef,
        traffic: &[TrafficTarget],
    ) -> PlatformResult<()>;

    async fn list_revisions(&self, svc: &ServiceRef) -> PlatformResult<Vec<Revision>>;

    async fn get_revision(&self, svc: &ServiceRef, revision: &str) -> PlatformResult<Revision>;

    async fn delete_revision(&self, svc: &ServiceRef, revision: &str) -> PlatformResult<()>;

    async fn wait_for_service_ready(&self, svc: &ServiceRef) -> PlatformResult<()>;
}
