//! In-memory fake of the compute platform.
//!
//! Models the Service/Revision/Traffic state transitions explicitly:
//! applying a template creates a sequentially named revision, traffic
//! writes are validated against the allocation invariants, and readiness
//! or delete failures can be injected. This is what makes the engine's
//! properties testable without live infrastructure.

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;

use gradient_core::types::{
    validate_allocation, Condition, ConditionState, Revision, Service, ServiceRef, TrafficTarget,
};

use crate::client::{PlatformClient, PlatformError, PlatformResult};

#[derive(Default)]
struct FakeState {
    services: HashMap<ServiceRef, ServiceEntry>,
    /// Monotonic clock driving revision creation timestamps.
    clock: u64,
    /// Per-service revision sequence numbers.
    seq: HashMap<ServiceRef, u32>,
    /// Message for the next readiness wait to fail with.
    fail_next_readiness: Option<String>,
    /// When set, readiness waits never resolve (for cancellation tests).
    hang_readiness: bool,
    /// Revision names whose deletion fails.
    fail_delete: HashSet<String>,
    /// Number of traffic/template writes issued so far.
    writes: u64,
}

struct ServiceEntry {
    service: Service,
    revisions: Vec<Revision>,
}

/// An in-memory platform for tests.
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next readiness wait with the given platform message.
    pub async fn fail_next_readiness(&self, message: &str) {
        self.state.lock().await.fail_next_readiness = Some(message.to_string());
    }

    /// Make readiness waits hang until the future is dropped.
    pub async fn hang_readiness(&self) {
        self.state.lock().await.hang_readiness = true;
    }

    /// Fail any delete of the named revision.
    pub async fn fail_delete_of(&self, revision: &str) {
        self.state
            .lock()
            .await
            .fail_delete
            .insert(revision.to_string());
    }

    /// Snapshot of the stored service, if any.
    pub async fn service(&self, svc: &ServiceRef) -> Option<Service> {
        self.state
            .lock()
            .await
            .services
            .get(svc)
            .map(|e| e.service.clone())
    }

    /// Snapshot of the stored revisions, in creation order.
    pub async fn revisions(&self, svc: &ServiceRef) -> Vec<Revision> {
        self.state
            .lock()
            .await
            .services
            .get(svc)
            .map(|e| e.revisions.clone())
            .unwrap_or_default()
    }

    /// Total number of mutating calls the fake has accepted.
    pub async fn write_count(&self) -> u64 {
        self.state.lock().await.writes
    }
}

impl PlatformClient for FakePlatform {
    async fn get_service(&self, svc: &ServiceRef) -> PlatformResult<Service> {
        self.state
            .lock()
            .await
            .services
            .get(svc)
            .map(|e| e.service.clone())
            .ok_or_else(|| PlatformError::ServiceNotFound(svc.clone()))
    }

    async fn create_or_update_service(
        &self,
        svc: &ServiceRef,
        desired: &Service,
    ) -> PlatformResult<Service> {
        validate_allocation(&desired.traffic)
            .map_err(|e| PlatformError::InvalidAllocation(e.to_string()))?;

        let mut state = self.state.lock().await;
        state.writes += 1;
        state.clock += 1;
        let created_at = state.clock;

        let seq = state.seq.entry(svc.clone()).or_insert(0);
        *seq += 1;
        let revision_name = format!("{}-{:05}", svc.service, seq);

        let mut applied = desired.clone();
        applied.name = svc.service.clone();
        applied.uri = format!("https://{}.{}.example.app", svc.service, svc.region);
        applied.template.revision = revision_name.clone();
        applied.conditions = vec![Condition::ready(ConditionState::Succeeded, "")];

        let revision = Revision {
            name: revision_name,
            image: applied.template.first_image().to_string(),
            created_at,
            conditions: vec![Condition::ready(ConditionState::Succeeded, "")],
        };

        let entry = state
            .services
            .entry(svc.clone())
            .or_insert_with(|| ServiceEntry {
                service: applied.clone(),
                revisions: Vec::new(),
            });
        entry.service = applied.clone();
        entry.revisions.push(revision);

        Ok(applied)
    }

    async fn update_traffic(
        &self,
        svc: &ServiceRef,
        traffic: &[TrafficTarget],
    ) -> PlatformResult<()> {
        validate_allocation(traffic)
            .map_err(|e| PlatformError::InvalidAllocation(e.to_string()))?;

        let mut state = self.state.lock().await;
        state.writes += 1;
        let entry = state
            .services
            .get_mut(svc)
            .ok_or_else(|| PlatformError::ServiceNotFound(svc.clone()))?;
        entry.service.traffic = traffic.to_vec();
        Ok(())
    }

    async fn list_revisions(&self, svc: &ServiceRef) -> PlatformResult<Vec<Revision>> {
        self.state
            .lock()
            .await
            .services
            .get(svc)
            .map(|e| e.revisions.clone())
            .ok_or_else(|| PlatformError::ServiceNotFound(svc.clone()))
    }

    async fn get_revision(&self, svc: &ServiceRef, revision: &str) -> PlatformResult<Revision> {
        self.state
            .lock()
            .await
            .services
            .get(svc)
            .and_then(|e| e.revisions.iter().find(|r| r.name == revision))
            .cloned()
            .ok_or_else(|| PlatformError::RevisionNotFound(revision.to_string()))
    }

    async fn delete_revision(&self, svc: &ServiceRef, revision: &str) -> PlatformResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_delete.contains(revision) {
            return Err(PlatformError::Api {
                status: 500,
                message: format!("injected delete failure for {revision}"),
            });
        }
        state.writes += 1;
        let entry = state
            .services
            .get_mut(svc)
            .ok_or_else(|| PlatformError::ServiceNotFound(svc.clone()))?;
        let before = entry.revisions.len();
        entry.revisions.retain(|r| r.name != revision);
        if entry.revisions.len() == before {
            return Err(PlatformError::RevisionNotFound(revision.to_string()));
        }
        Ok(())
    }

    async fn wait_for_service_ready(&self, svc: &ServiceRef) -> PlatformResult<()> {
        let hang = {
            let mut state = self.state.lock().await;
            if let Some(message) = state.fail_next_readiness.take() {
                return Err(PlatformError::NotReady(message));
            }
            if !state.services.contains_key(svc) {
                return Err(PlatformError::ServiceNotFound(svc.clone()));
            }
            state.hang_readiness
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
