//! CANARY_CLEANUP stage — bound revision growth after a deployment
//! stabilizes.
//!
//! Unlike the sync stage's best-effort prune, a delete failure here
//! fails the stage: cleanup is a dedicated pipeline step, not a
//! convenience.

use tracing::{info, warn};

use gradient_platform::PlatformClient;
use gradient_revision::RevisionManager;

use crate::context::{StageContext, StageOutcome};
use crate::error::StageResult;
use crate::stages::CleanupConfig;

pub async fn execute<C: PlatformClient>(
    client: &C,
    ctx: &StageContext<'_>,
    cfg: CleanupConfig,
) -> StageResult<StageOutcome> {
    let service_name = ctx.service_name()?;
    let svc = ctx.service_ref(&service_name);
    info!(
        service = %svc,
        keep_count = cfg.keep_count,
        keep_latest = cfg.keep_latest,
        "cleaning up revisions"
    );

    let manager = RevisionManager::new(client);

    let before = manager.list(&svc).await?;
    info!(revisions = before.len(), "revisions before cleanup");
    for rev in &before {
        info!(
            revision = %rev.name,
            percent = rev.traffic_percent,
            created_at = rev.created_at,
            "revision"
        );
    }

    let deleted = manager.cleanup(&svc, cfg.keep_count, cfg.keep_latest).await?;

    match manager.list(&svc).await {
        Ok(after) => info!(deleted, remaining = after.len(), "cleanup complete"),
        Err(err) => warn!(error = %err, "failed to list revisions after cleanup"),
    }

    Ok(StageOutcome::new())
}
