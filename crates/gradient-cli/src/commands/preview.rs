//! `gradient preview` — show what a deploy would change.

use std::path::Path;

use tracing::info;

use gradient_core::config::DeployTargetConfig;
use gradient_preview::plan_for_target;

use super::{load_app, platform_client};

pub async fn run(path: &str, target_path: &str) -> anyhow::Result<()> {
    let app_dir = Path::new(path);
    let app = load_app(app_dir)?;
    let target = DeployTargetConfig::from_file(Path::new(target_path))?;
    let client = platform_client(&target)?;

    info!(app = %app.name, target = %target.name, "computing plan preview");

    let result = plan_for_target(&client, &app, &target, app_dir).await?;

    println!("{}", result.summary);
    println!();
    print!("{}", result.details);

    Ok(())
}
