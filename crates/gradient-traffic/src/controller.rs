//! Traffic controller — applies computed allocations to a live service.
//!
//! The controller composes the pure split logic with a single remote
//! write. It never issues a relative change: every update carries the
//! complete target allocation.

use tracing::info;

use gradient_core::types::{ServiceRef, TrafficTarget};
use gradient_platform::PlatformClient;

use crate::error::{TrafficError, TrafficResult};
use crate::split;

/// Applies traffic-split target sets against the platform.
pub struct TrafficController<'a, C> {
    client: &'a C,
}

impl<'a, C: PlatformClient> TrafficController<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Shift `percent` of traffic toward the latest revision.
    ///
    /// Returns the allocation that was applied. The service must exist;
    /// absence surfaces as a platform error, not a create path.
    pub async fn promote(
        &self,
        svc: &ServiceRef,
        percent: u32,
    ) -> TrafficResult<Vec<TrafficTarget>> {
        if percent > 100 {
            return Err(TrafficError::InvalidPercent(percent as i64));
        }

        // Existence probe before any allocation work.
        self.client.get_service(svc).await?;

        let allocation = if percent == 100 {
            split::promote_allocation(100, &[])
        } else {
            let revisions = self.client.list_revisions(svc).await?;
            split::promote_allocation(percent, &revisions)
        };

        self.client.update_traffic(svc, &allocation).await?;
        info!(service = %svc, percent, "traffic promoted");
        Ok(allocation)
    }

    /// Route 100% of traffic to a pinned named revision.
    pub async fn rollback(&self, svc: &ServiceRef, revision: &str) -> TrafficResult<()> {
        let allocation = split::rollback_allocation(revision);
        self.client.update_traffic(svc, &allocation).await?;
        info!(service = %svc, revision, "traffic rolled back");
        Ok(())
    }

    /// Current allocation as `(target key, percent)` rows for display.
    /// The key is `"latest"` or the pinned revision name.
    pub async fn current_allocation(
        &self,
        svc: &ServiceRef,
    ) -> TrafficResult<Vec<(String, u32)>> {
        let service = self.client.get_service(svc).await?;
        Ok(service
            .traffic
            .iter()
            .map(|t| (t.key().to_string(), t.percent()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradient_core::types::{Container, RevisionTemplate, Service};
    use gradient_platform::{FakePlatform, PlatformError};
    use std::collections::HashMap;

    fn desired(image: &str) -> Service {
        Service {
            name: String::new(),
            uri: String::new(),
            template: RevisionTemplate {
                revision: String::new(),
                containers: vec![Container {
                    image: image.to_string(),
                    port: None,
                    resources: None,
                }],
                labels: HashMap::new(),
                annotations: HashMap::new(),
                container_concurrency: None,
            },
            traffic: vec![TrafficTarget::Latest { percent: 100 }],
            conditions: vec![],
        }
    }

    fn svc() -> ServiceRef {
        ServiceRef::new("proj", "eu-west1", "api")
    }

    async fn deploy_n(platform: &FakePlatform, n: usize) {
        for i in 1..=n {
            platform
                .create_or_update_service(&svc(), &desired(&format!("img:v{i}")))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn promote_with_two_revisions_splits_against_previous() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 2).await;

        let controller = TrafficController::new(&platform);
        let applied = controller.promote(&svc(), 10).await.unwrap();

        assert_eq!(
            applied,
            vec![
                TrafficTarget::Latest { percent: 10 },
                TrafficTarget::Revision {
                    revision: "api-00001".to_string(),
                    percent: 90,
                },
            ]
        );
        let stored = platform.service(&svc()).await.unwrap();
        assert_eq!(stored.traffic, applied);
    }

    #[tokio::test]
    async fn promote_single_revision_falls_back_to_full_latest() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 1).await;

        let controller = TrafficController::new(&platform);
        let applied = controller.promote(&svc(), 25).await.unwrap();
        assert_eq!(applied, vec![TrafficTarget::Latest { percent: 100 }]);
    }

    #[tokio::test]
    async fn promote_missing_service_is_platform_error() {
        let platform = FakePlatform::new();
        let controller = TrafficController::new(&platform);
        let err = controller.promote(&svc(), 50).await.unwrap_err();
        assert!(matches!(
            err,
            TrafficError::Platform(PlatformError::ServiceNotFound(_))
        ));
        assert_eq!(platform.write_count().await, 0);
    }

    #[tokio::test]
    async fn rollback_pins_and_applies() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 2).await;

        let controller = TrafficController::new(&platform);
        controller.rollback(&svc(), "api-00001").await.unwrap();

        let stored = platform.service(&svc()).await.unwrap();
        assert_eq!(
            stored.traffic,
            vec![TrafficTarget::Revision {
                revision: "api-00001".to_string(),
                percent: 100,
            }]
        );
    }

    #[tokio::test]
    async fn current_allocation_rows() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 2).await;
        platform
            .update_traffic(
                &svc(),
                &[
                    TrafficTarget::Latest { percent: 30 },
                    TrafficTarget::Revision {
                        revision: "api-00001".to_string(),
                        percent: 70,
                    },
                ],
            )
            .await
            .unwrap();

        let controller = TrafficController::new(&platform);
        let rows = controller.current_allocation(&svc()).await.unwrap();
        assert_eq!(
            rows,
            vec![("latest".to_string(), 30), ("api-00001".to_string(), 70)]
        );
    }
}
