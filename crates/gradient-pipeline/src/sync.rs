//! SYNC stage — converge the live service to the desired template.
//!
//! Deploys a new revision from the manifest and decides initial traffic
//! exposure. For quick sync this routes 100% immediately; a pipeline can
//! set `skip_traffic_shift` to deploy dark and promote later.

use tracing::{info, warn};

use gradient_core::manifest;
use gradient_core::types::{Service, TrafficTarget};
use gradient_platform::{PlatformClient, PlatformError};
use gradient_revision::RevisionManager;

use crate::context::{cancelled, StageContext, StageOutcome};
use crate::error::{StageError, StageResult};
use crate::stages::SyncConfig;

/// Retention applied by the post-deploy prune.
const PRUNE_KEEP_COUNT: usize = 5;

pub async fn execute<C: PlatformClient>(
    client: &C,
    ctx: &StageContext<'_>,
    cfg: SyncConfig,
) -> StageResult<StageOutcome> {
    let mut desired = manifest::load_from_dir(ctx.app_dir, ctx.app.manifest_path())?;
    if let Some(image) = &ctx.app.input.image {
        info!(image, "overriding container image");
        manifest::apply_image_override(&mut desired, image);
    }

    let service_name = resolve_service_name(ctx, &desired)?;
    let svc = ctx.service_ref(&service_name);
    info!(service = %svc, "deploying service");

    // Absence is not an error here: it selects the create path.
    let existing = match client.get_service(&svc).await {
        Ok(service) => Some(service),
        Err(err) if err.is_not_found() => {
            info!(service = %svc, "service does not exist, creating");
            None
        }
        Err(err) => return Err(err.into()),
    };

    desired.name = service_name.clone();
    desired.traffic = match (&existing, cfg.skip_traffic_shift) {
        (Some(current), true) => {
            // The new revision receives whatever weight the allocation
            // already assigns to latest, which may be 0%.
            info!("preserving existing traffic allocation");
            current.traffic.clone()
        }
        _ => {
            info!("routing 100% traffic to the new revision");
            vec![TrafficTarget::Latest { percent: 100 }]
        }
    };

    let applied = client.create_or_update_service(&svc, &desired).await?;

    info!(service = %svc, "waiting for service to become ready");
    let cancel = ctx.cancel.clone();
    tokio::select! {
        result = client.wait_for_service_ready(&svc) => match result {
            Ok(()) => {}
            Err(PlatformError::NotReady(message)) => {
                return Err(StageError::ReadinessFailed(message));
            }
            Err(err) => return Err(err.into()),
        },
        _ = cancelled(cancel) => return Err(StageError::Cancelled),
    }

    info!(
        service = %svc,
        revision = %applied.template.revision,
        url = %applied.uri,
        "deployed revision is ready"
    );

    if cfg.prune {
        // Best-effort: a failed prune never fails the sync.
        let manager = RevisionManager::new(client);
        match manager.cleanup(&svc, PRUNE_KEEP_COUNT, true).await {
            Ok(deleted) => info!(deleted, "pruned old revisions"),
            Err(err) => warn!(error = %err, "failed to prune old revisions"),
        }
    }

    Ok(StageOutcome::new()
        .with("revision", applied.template.revision)
        .with("service_url", applied.uri)
        .with("service_name", service_name))
}

/// Resolve the service name from explicit config or manifest metadata.
fn resolve_service_name(ctx: &StageContext<'_>, desired: &Service) -> StageResult<String> {
    if let Some(name) = &ctx.app.input.service_name {
        if !name.is_empty() {
            return Ok(name.clone());
        }
    }
    if let Some(name) = manifest::service_name_from_labels(desired) {
        return Ok(name.to_string());
    }
    Err(StageError::Config(
        "service name not specified in manifest or config".to_string(),
    ))
}
