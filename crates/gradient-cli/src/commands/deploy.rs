//! `gradient deploy` — run a deployment stage by stage.

use std::path::Path;

use tokio::sync::watch;
use tracing::{error, info, warn};

use gradient_core::config::DeployTargetConfig;
use gradient_pipeline::{
    build_pipeline_sync_stages, build_quick_sync_stages, determine_strategy, determine_versions,
    execute_stage, PipelineStage, StageContext, StageRequest, SyncStrategy, STAGE_ROLLBACK,
};

use super::{load_app, platform_client};

pub async fn run(path: &str, target_path: &str, rollback_on_failure: bool) -> anyhow::Result<()> {
    let app_dir = Path::new(path);
    let app = load_app(app_dir)?;
    let target = DeployTargetConfig::from_file(Path::new(target_path))?;
    let client = platform_client(&target)?;

    let versions = determine_versions(&app);
    info!(
        app = %app.name,
        target = %target.name,
        version = %versions.version,
        image = %versions.name,
        "starting deployment"
    );

    let stages = match determine_strategy(&app) {
        SyncStrategy::QuickSync => {
            info!("strategy: quick sync");
            build_quick_sync_stages(&app)
        }
        SyncStrategy::PipelineSync => {
            info!("strategy: pipeline sync");
            let pipeline = app.pipeline.as_ref().map(|p| &p.stages[..]).unwrap_or(&[]);
            let requested: Vec<StageRequest> = pipeline
                .iter()
                .enumerate()
                .map(|(index, decl)| {
                    Ok(StageRequest {
                        index: index as u32,
                        name: decl.name.clone(),
                        rollback: false,
                        params: decl.params()?,
                    })
                })
                .collect::<Result<_, serde_json::Error>>()?;
            build_pipeline_sync_stages(&requested)
        }
    };

    // Ctrl-c flips the cancellation signal every stage watches.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    for stage in &stages {
        run_stage(&client, &app, &target, app_dir, cancel_rx.clone(), stage, rollback_on_failure)
            .await?;
    }

    info!(app = %app.name, "deployment finished");
    Ok(())
}

async fn run_stage(
    client: &gradient_platform::HttpClient,
    app: &gradient_core::config::ApplicationConfig,
    target: &DeployTargetConfig,
    app_dir: &Path,
    cancel: watch::Receiver<bool>,
    stage: &PipelineStage,
    rollback_on_failure: bool,
) -> anyhow::Result<()> {
    info!(index = stage.index, stage = %stage.name, "{}", stage.description);

    let ctx = StageContext::new(app, target, app_dir, cancel.clone());
    match execute_stage(client, &ctx, &stage.name, stage.params.as_ref()).await {
        Ok(outcome) => {
            for (key, value) in &outcome.metadata {
                info!(stage = %stage.name, "{key}: {value}");
            }
            println!("{}  SUCCESS", stage.name);
            Ok(())
        }
        Err(err) => {
            error!(stage = %stage.name, error = %err, "stage failed");
            println!("{}  FAILURE", stage.name);

            // The engine never rolls back on its own; this host does so
            // only when asked to.
            if rollback_on_failure && stage.name != STAGE_ROLLBACK {
                warn!("executing rollback stage");
                let ctx = StageContext::new(app, target, app_dir, cancel);
                match execute_stage(client, &ctx, STAGE_ROLLBACK, None).await {
                    Ok(_) => println!("{STAGE_ROLLBACK}  SUCCESS"),
                    Err(rollback_err) => {
                        error!(error = %rollback_err, "rollback failed");
                        println!("{STAGE_ROLLBACK}  FAILURE");
                    }
                }
            }

            Err(err.into())
        }
    }
}
