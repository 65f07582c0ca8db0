//! Stage dispatcher — the single entry point the host calls per stage.
//!
//! Routes a named stage-execution request to the matching executor, or
//! fails fast for any other name. Executor errors are returned unchanged
//! so the host can distinguish failure causes.

use tracing::{error, info};

use gradient_platform::PlatformClient;

use crate::context::{StageContext, StageOutcome};
use crate::error::StageResult;
use crate::stages::{decode_stage_config, StageConfig};
use crate::{cleanup, promote, rollback, sync};

/// Execute the named stage with the given parameters.
pub async fn execute_stage<C: PlatformClient>(
    client: &C,
    ctx: &StageContext<'_>,
    stage_name: &str,
    params: Option<&serde_json::Value>,
) -> StageResult<StageOutcome> {
    info!(stage = stage_name, "executing stage");

    let config = decode_stage_config(stage_name, params).inspect_err(|err| {
        error!(stage = stage_name, error = %err, "stage rejected");
    })?;

    match config {
        StageConfig::Sync(cfg) => sync::execute(client, ctx, cfg).await,
        StageConfig::Promote(cfg) => promote::execute(client, ctx, cfg).await,
        StageConfig::Rollback(cfg) => rollback::execute(client, ctx, cfg).await,
        StageConfig::CanaryCleanup(cfg) => cleanup::execute(client, ctx, cfg).await,
    }
}
