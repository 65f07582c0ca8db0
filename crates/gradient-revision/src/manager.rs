//! Revision lifecycle manager.
//!
//! Lists and classifies a service's revisions against its current traffic
//! allocation and bounds revision growth under a retention policy. The
//! manager holds no state of its own; every call reconstructs its view
//! from the platform.

use std::collections::HashMap;

use tracing::{debug, info};

use gradient_core::types::{ServiceRef, TrafficTarget};
use gradient_platform::PlatformClient;

use crate::error::{RevisionError, RevisionResult};

/// A revision classified against the service's current allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionInfo {
    pub name: String,
    pub image: String,
    /// Unix timestamp (seconds) of creation.
    pub created_at: u64,
    /// Traffic currently routed to this revision, directly or via latest.
    pub traffic_percent: u32,
    /// Whether this is the service's current template revision.
    pub is_latest: bool,
}

/// Manages revision listing, resolution, and retention cleanup.
pub struct RevisionManager<'a, C> {
    client: &'a C,
}

impl<'a, C: PlatformClient> RevisionManager<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// List all revisions, newest first, classified with traffic and
    /// latest-revision flags resolved from the live service.
    pub async fn list(&self, svc: &ServiceRef) -> RevisionResult<Vec<RevisionInfo>> {
        let revisions = self.client.list_revisions(svc).await?;
        let service = self.client.get_service(svc).await?;

        let latest = service.template.revision.clone();
        let traffic = allocation_by_revision(&service.traffic, &latest);

        let mut infos: Vec<RevisionInfo> = revisions
            .into_iter()
            .map(|rev| RevisionInfo {
                traffic_percent: traffic.get(rev.name.as_str()).copied().unwrap_or(0),
                is_latest: rev.name == latest,
                name: rev.name,
                image: rev.image,
                created_at: rev.created_at,
            })
            .collect();

        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(infos)
    }

    /// Classified info for one named revision.
    pub async fn get(&self, svc: &ServiceRef, revision: &str) -> RevisionResult<RevisionInfo> {
        let rev = self.client.get_revision(svc, revision).await?;
        let service = self.client.get_service(svc).await?;

        let latest = service.template.revision.clone();
        let traffic = allocation_by_revision(&service.traffic, &latest);

        Ok(RevisionInfo {
            traffic_percent: traffic.get(rev.name.as_str()).copied().unwrap_or(0),
            is_latest: rev.name == latest,
            name: rev.name,
            image: rev.image,
            created_at: rev.created_at,
        })
    }

    /// The most recent revision.
    pub async fn latest(&self, svc: &ServiceRef) -> RevisionResult<RevisionInfo> {
        let mut infos = self.list(svc).await?;
        if infos.is_empty() {
            return Err(RevisionError::NoRevisions(svc.service.clone()));
        }
        Ok(infos.remove(0))
    }

    /// The previous revision: always the second-most-recent by creation
    /// time, regardless of where traffic currently points.
    pub async fn previous(&self, svc: &ServiceRef) -> RevisionResult<RevisionInfo> {
        let mut infos = self.list(svc).await?;
        if infos.len() < 2 {
            return Err(RevisionError::NoPrevious(svc.service.clone()));
        }
        Ok(infos.remove(1))
    }

    /// Delete old revisions under the retention policy.
    ///
    /// The newest `keep_count` revisions are always retained. Among the
    /// remainder, only 0%-traffic revisions are deleted; with
    /// `keep_latest` the current template revision is exempt even outside
    /// the retained window. Revisions still carrying traffic are skipped
    /// silently. A delete failure aborts the remaining batch.
    ///
    /// Returns the number of revisions deleted.
    pub async fn cleanup(
        &self,
        svc: &ServiceRef,
        keep_count: usize,
        keep_latest: bool,
    ) -> RevisionResult<usize> {
        let infos = self.list(svc).await?;
        if infos.len() <= keep_count {
            debug!(service = %svc, revisions = infos.len(), keep_count, "nothing to clean up");
            return Ok(0);
        }

        let mut deleted = 0;
        for info in infos.iter().skip(keep_count) {
            if keep_latest && info.is_latest {
                debug!(revision = %info.name, "keeping latest revision");
                continue;
            }
            if info.traffic_percent != 0 {
                debug!(
                    revision = %info.name,
                    percent = info.traffic_percent,
                    "keeping revision with traffic"
                );
                continue;
            }

            self.client
                .delete_revision(svc, &info.name)
                .await
                .map_err(|source| RevisionError::Delete {
                    revision: info.name.clone(),
                    source,
                })?;
            deleted += 1;
            info!(service = %svc, revision = %info.name, "deleted revision");
        }

        Ok(deleted)
    }
}

/// Resolve an allocation to a revision-name → percent map. A latest
/// target counts toward the service's current template revision.
fn allocation_by_revision<'t>(
    traffic: &'t [TrafficTarget],
    latest_revision: &'t str,
) -> HashMap<&'t str, u32> {
    let mut map = HashMap::new();
    for target in traffic {
        let key = match target {
            TrafficTarget::Latest { .. } => latest_revision,
            TrafficTarget::Revision { revision, .. } => revision.as_str(),
        };
        map.insert(key, target.percent());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradient_core::types::{Container, RevisionTemplate, Service};
    use gradient_platform::FakePlatform;
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
    async fn list_is_newest_first_and_classified() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 3).await;

        let manager = RevisionManager::new(&platform);
        let infos = manager.list(&svc()).await.unwrap();

        assert_eq!(infos.len(), 3);
        assert_eq!(infos[0].name, "api-00003");
        assert_eq!(infos[2].name, "api-00001");

        // The latest target resolves to the template revision.
        assert!(infos[0].is_latest);
        assert_eq!(infos[0].traffic_percent, 100);
        assert_eq!(infos[1].traffic_percent, 0);
    }

    #[tokio::test]
    async fn split_allocation_classifies_both_sides() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 2).await;
        platform
            .update_traffic(
                &svc(),
                &[
                    TrafficTarget::Latest { percent: 10 },
                    TrafficTarget::Revision {
                        revision: "api-00001".to_string(),
                        percent: 90,
                    },
                ],
            )
            .await
            .unwrap();

        let manager = RevisionManager::new(&platform);
        let infos = manager.list(&svc()).await.unwrap();
        assert_eq!(infos[0].traffic_percent, 10);
        assert_eq!(infos[1].traffic_percent, 90);
    }

    #[tokio::test]
    async fn previous_is_second_newest() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 3).await;

        let manager = RevisionManager::new(&platform);
        assert_eq!(manager.latest(&svc()).await.unwrap().name, "api-00003");
        assert_eq!(manager.previous(&svc()).await.unwrap().name, "api-00002");
    }

    #[tokio::test]
    async fn previous_requires_two_revisions() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 1).await;

        let manager = RevisionManager::new(&platform);
        let err = manager.previous(&svc()).await.unwrap_err();
        assert!(matches!(err, RevisionError::NoPrevious(_)));
    }

    #[tokio::test]
    async fn cleanup_keeps_window_and_deletes_idle() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 5).await;

        // Keep 2: api-00005, api-00004 retained; 3..1 are idle (latest
        // carries all traffic) and deletable, but keep_latest only covers
        // the template revision which is inside the window anyway.
        let manager = RevisionManager::new(&platform);
        let deleted = manager.cleanup(&svc(), 2, true).await.unwrap();
        assert_eq!(deleted, 3);

        let names: Vec<String> = platform
            .revisions(&svc())
            .await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["api-00004", "api-00005"]);
    }

    #[tokio::test]
    async fn cleanup_never_deletes_revisions_with_traffic() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 4).await;
        // Pin 90% on the oldest revision.
        platform
            .update_traffic(
                &svc(),
                &[
                    TrafficTarget::Latest { percent: 10 },
                    TrafficTarget::Revision {
                        revision: "api-00001".to_string(),
                        percent: 90,
                    },
                ],
            )
            .await
            .unwrap();

        let manager = RevisionManager::new(&platform);
        let deleted = manager.cleanup(&svc(), 1, true).await.unwrap();

        // api-00002 and api-00003 are idle and deleted; api-00001 keeps
        // its traffic and survives outside the window.
        assert_eq!(deleted, 2);
        let names: Vec<String> = platform
            .revisions(&svc())
            .await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["api-00001", "api-00004"]);
    }

    #[tokio::test]
    async fn cleanup_keep_latest_exempts_template_revision() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 3).await;
        // Route everything to the oldest revision: the template revision
        // (api-00003) now carries 0% and sits outside a keep_count=1
        // window once older revisions are pinned ahead of it by traffic.
        platform
            .update_traffic(
                &svc(),
                &[TrafficTarget::Revision {
                    revision: "api-00001".to_string(),
                    percent: 100,
                }],
            )
            .await
            .unwrap();

        let manager = RevisionManager::new(&platform);
        let deleted = manager.cleanup(&svc(), 0, true).await.unwrap();

        // api-00002 is idle and goes; api-00003 is latest (exempt),
        // api-00001 carries traffic.
        assert_eq!(deleted, 1);
        let names: Vec<String> = platform
            .revisions(&svc())
            .await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["api-00001", "api-00003"]);
    }

    #[tokio::test]
    async fn cleanup_without_keep_latest_deletes_idle_template_revision() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 2).await;
        platform
            .update_traffic(
                &svc(),
                &[TrafficTarget::Revision {
                    revision: "api-00001".to_string(),
                    percent: 100,
                }],
            )
            .await
            .unwrap();

        let manager = RevisionManager::new(&platform);
        let deleted = manager.cleanup(&svc(), 0, false).await.unwrap();
        assert_eq!(deleted, 1);

        let names: Vec<String> = platform
            .revisions(&svc())
            .await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["api-00001"]);
    }

    #[tokio::test]
    async fn cleanup_under_keep_count_is_a_noop() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 3).await;

        let manager = RevisionManager::new(&platform);
        let deleted = manager.cleanup(&svc(), 5, true).await.unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(platform.revisions(&svc()).await.len(), 3);
    }

    #[tokio::test]
    async fn cleanup_delete_failure_aborts_batch() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 5).await;
        // Deletion order is newest-first among the excess: 3, 2, 1.
        platform.fail_delete_of("api-00002").await;

        let manager = RevisionManager::new(&platform);
        let err = manager.cleanup(&svc(), 2, true).await.unwrap_err();
        assert!(matches!(err, RevisionError::Delete { ref revision, .. } if revision == "api-00002"));

        // api-00003 went before the failure; api-00001 was never reached.
        let names: Vec<String> = platform
            .revisions(&svc())
            .await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["api-00001", "api-00002", "api-00004", "api-00005"]);
    }

    #[tokio::test]
    async fn cleanup_bounded_by_excess_count() {
        let platform = FakePlatform::new();
        deploy_n(&platform, 6).await;

        let manager = RevisionManager::new(&platform);
        let deleted = manager.cleanup(&svc(), 4, true).await.unwrap();
        assert!(deleted <= 2);
    }
}
