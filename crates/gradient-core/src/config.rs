//! Application and deploy-target configuration.
//!
//! The application config (`gradient.toml`) declares what to deploy and,
//! optionally, an explicit stage pipeline; the deploy-target config names
//! the (project, region) the engine operates against. Stage parameters
//! are carried as opaque values here and decoded per stage name by the
//! pipeline crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Manifest path used when the application config does not set one.
pub const DEFAULT_MANIFEST_PATH: &str = "service.json";

/// Per-application deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name. Also the fallback service name for stages that
    /// run without a manifest in hand.
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Path to the service manifest, relative to the application directory.
    #[serde(default)]
    pub service_manifest_path: Option<String>,
    #[serde(default)]
    pub input: InputConfig,
    /// Quick-sync options, used when no pipeline is declared.
    #[serde(default)]
    pub quick_sync: Option<QuickSyncConfig>,
    /// Explicit stage pipeline. Its presence alone selects pipeline sync.
    #[serde(default)]
    pub pipeline: Option<PipelineSpec>,
}

impl ApplicationConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ApplicationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Manifest path with the `service.json` default applied.
    pub fn manifest_path(&self) -> &str {
        self.service_manifest_path
            .as_deref()
            .unwrap_or(DEFAULT_MANIFEST_PATH)
    }
}

/// Deployment inputs. Each field overrides the corresponding value from
/// the manifest or the deploy target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Service name. Falls back to manifest metadata when unset.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Container image override applied on top of the manifest.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Options for the quick-sync strategy (deploy and route 100% now).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickSyncConfig {
    /// Remove unused revisions after the deploy.
    #[serde(default)]
    pub prune: bool,
}

/// An explicit, ordered stage pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub stages: Vec<StageDecl>,
}

/// One declared pipeline stage. Parameters stay opaque until the
/// dispatcher decodes them against the named stage's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDecl {
    pub name: String,
    #[serde(default)]
    pub with: Option<toml::Value>,
}

impl StageDecl {
    /// Stage parameters re-encoded as JSON for schema decoding.
    pub fn params(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        match &self.with {
            Some(value) => serde_json::to_value(value).map(Some),
            None => Ok(None),
        }
    }
}

/// One logical deployment target: a (project, region) on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployTargetConfig {
    pub name: String,
    pub project: String,
    pub region: String,
    /// Control-API endpoint, e.g. `http://127.0.0.1:9090`.
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// Credentials reference, passed through to the platform client.
    #[serde(default)]
    pub credentials_file: Option<String>,
}

impl DeployTargetConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DeployTargetConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
