//! ROLLBACK stage — route 100% of traffic to a known-good revision.
//!
//! The target is pinned by name, never "latest": latest may itself be
//! the broken revision. A configured revision is used verbatim without
//! an existence pre-check; a non-existent name surfaces as a platform
//! error from the traffic update.

use tracing::{info, warn};

use gradient_platform::PlatformClient;
use gradient_revision::RevisionManager;
use gradient_traffic::TrafficController;

use crate::context::{StageContext, StageOutcome};
use crate::error::StageResult;
use crate::stages::RollbackConfig;

pub async fn execute<C: PlatformClient>(
    client: &C,
    ctx: &StageContext<'_>,
    cfg: RollbackConfig,
) -> StageResult<StageOutcome> {
    let service_name = ctx.service_name()?;
    let svc = ctx.service_ref(&service_name);
    info!(service = %svc, "rolling back service");

    let manager = RevisionManager::new(client);

    let target_revision = if !cfg.revision.is_empty() {
        info!(revision = %cfg.revision, "rolling back to configured revision");
        cfg.revision
    } else {
        let previous = manager.previous(&svc).await?;
        info!(revision = %previous.name, "rolling back to previous revision");
        previous.name
    };

    // Target introspection is display-only; a failed lookup never
    // blocks the rollback.
    match manager.get(&svc, &target_revision).await {
        Ok(rev) => info!(revision = %target_revision, image = %rev.image, "rollback target"),
        Err(err) => warn!(error = %err, "failed to fetch rollback target info"),
    }

    let controller = TrafficController::new(client);
    controller.rollback(&svc, &target_revision).await?;

    info!(service = %svc, revision = %target_revision, "rollback applied");
    Ok(StageOutcome::new())
}
