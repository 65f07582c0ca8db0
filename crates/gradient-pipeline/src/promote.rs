//! PROMOTE stage — shift traffic weight toward the latest revision.
//!
//! Deploys nothing new; only the traffic allocation changes. Used for
//! progressive delivery: 0% is a smoke test, 10% a canary, 100% a full
//! promotion.

use tracing::{info, warn};

use gradient_platform::PlatformClient;
use gradient_traffic::{split, TrafficController};

use crate::context::{StageContext, StageOutcome};
use crate::error::{StageError, StageResult};
use crate::stages::PromoteConfig;

pub async fn execute<C: PlatformClient>(
    client: &C,
    ctx: &StageContext<'_>,
    cfg: PromoteConfig,
) -> StageResult<StageOutcome> {
    // Range check before any remote call: an out-of-range percentage is
    // a configuration error, not a platform error.
    let percent = split::validate_percent(cfg.percent).map_err(|_| {
        StageError::Config(format!(
            "invalid traffic percentage: {} (must be 0-100)",
            cfg.percent
        ))
    })?;

    let service_name = ctx.service_name()?;
    let svc = ctx.service_ref(&service_name);
    info!(service = %svc, percent, "promoting service");

    let controller = TrafficController::new(client);

    // Allocation before and after is surfaced for observability only;
    // a failed read never gates the promotion.
    match controller.current_allocation(&svc).await {
        Ok(rows) => log_allocation("current traffic allocation", &rows),
        Err(err) => warn!(error = %err, "failed to read current traffic"),
    }

    controller.promote(&svc, percent).await?;

    match controller.current_allocation(&svc).await {
        Ok(rows) => log_allocation("new traffic allocation", &rows),
        Err(err) => warn!(error = %err, "failed to read new traffic"),
    }

    info!(service = %svc, percent, "promotion applied");

    Ok(StageOutcome::new()
        .with("traffic_percent", percent.to_string())
        .with("service_name", service_name))
}

fn log_allocation(label: &str, rows: &[(String, u32)]) {
    for (key, percent) in rows {
        info!(allocation = %key, percent, "{label}");
    }
}
