//! Plan-preview driver.
//!
//! Loads the desired manifest, applies overrides, probes the live
//! service, and produces the create/update plan. Performs zero writes;
//! errors are limited to manifest-load and read-call failures.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use gradient_core::config::{ApplicationConfig, DeployTargetConfig};
use gradient_core::manifest::{self, ManifestError};
use gradient_core::types::ServiceRef;
use gradient_platform::{PlatformClient, PlatformError};

use crate::diff::{plan_create, plan_update, PlanPreviewResult};

/// Result type alias for plan-preview operations.
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Errors that can occur while computing a plan preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Compute the plan preview for one deploy target.
pub async fn plan_for_target<C: PlatformClient>(
    client: &C,
    app: &ApplicationConfig,
    target: &DeployTargetConfig,
    app_dir: &Path,
) -> PreviewResult<PlanPreviewResult> {
    let mut desired = manifest::load_from_dir(app_dir, app.manifest_path())?;
    if let Some(image) = &app.input.image {
        manifest::apply_image_override(&mut desired, image);
    }

    // Input config overrides the deploy target, the manifest supplies
    // the service name unless the input names one.
    let project = app.input.project.as_deref().unwrap_or(&target.project);
    let region = app.input.region.as_deref().unwrap_or(&target.region);
    let service_name = app
        .input
        .service_name
        .as_deref()
        .unwrap_or(&desired.name)
        .to_string();
    desired.name = service_name.clone();

    let svc = ServiceRef::new(project, region, &service_name);
    match client.get_service(&svc).await {
        Ok(current) => {
            debug!(service = %svc, "live service found, computing update plan");
            Ok(plan_update(&current, &desired, project, region, &target.name))
        }
        Err(err) if err.is_not_found() => {
            debug!(service = %svc, "no live service, computing create plan");
            Ok(plan_create(&desired, project, region, &target.name))
        }
        Err(err) => Err(err.into()),
    }
}
