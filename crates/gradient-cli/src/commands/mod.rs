pub mod deploy;
pub mod preview;

use std::path::Path;

use anyhow::Context;

use gradient_core::config::{ApplicationConfig, DeployTargetConfig};
use gradient_platform::HttpClient;

/// Load the application config from the application directory.
pub fn load_app(app_dir: &Path) -> anyhow::Result<ApplicationConfig> {
    let path = app_dir.join("gradient.toml");
    ApplicationConfig::from_file(&path)
        .with_context(|| format!("loading application config {}", path.display()))
}

/// Build the platform client for a deploy target.
///
/// The credentials reference is passed through as a bearer token; the
/// engine performs no credential resolution of its own.
pub fn platform_client(target: &DeployTargetConfig) -> anyhow::Result<HttpClient> {
    let endpoint = target
        .api_endpoint
        .as_deref()
        .with_context(|| format!("deploy target '{}' has no api_endpoint", target.name))?;

    let token = match &target.credentials_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading credentials file {path}"))?
                .trim()
                .to_string(),
        ),
        None => None,
    };

    Ok(HttpClient::new(endpoint, token)?)
}
