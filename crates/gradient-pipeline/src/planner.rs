//! Deployment planning — strategy selection, stage-list construction,
//! and version derivation.
//!
//! Invoked once per deployment, before any stage executor runs. Stage
//! semantics are deliberately not validated here: a PROMOTE before a
//! SYNC, or an out-of-range percentage, is caught at execution time.

use serde_json::json;

use gradient_core::config::ApplicationConfig;

use crate::stages::{stage_description, STAGE_SYNC};

/// How a deployment will be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Deploy and immediately route 100% traffic to the new revision.
    QuickSync,
    /// Run the application's explicit, ordered stage pipeline.
    PipelineSync,
}

/// A stage as requested by the host when building a pipeline.
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub index: u32,
    pub name: String,
    pub rollback: bool,
    pub params: Option<serde_json::Value>,
}

/// A fully stamped stage, ready for sequential execution by the host.
#[derive(Debug, Clone)]
pub struct PipelineStage {
    pub index: u32,
    pub name: String,
    pub rollback: bool,
    pub description: String,
    pub params: Option<serde_json::Value>,
}

/// Version information derived from the deployment inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub kind: &'static str,
    pub version: String,
    /// The full image reference the version was derived from.
    pub name: String,
}

/// Pipeline sync if and only if the application declares an explicit
/// stage list. No other signal influences this choice.
pub fn determine_strategy(app: &ApplicationConfig) -> SyncStrategy {
    if app.pipeline.is_some() {
        SyncStrategy::PipelineSync
    } else {
        SyncStrategy::QuickSync
    }
}

/// Derive the human-readable version from the configured image.
pub fn determine_versions(app: &ApplicationConfig) -> VersionInfo {
    let image = app.input.image.as_deref().unwrap_or("");
    VersionInfo {
        kind: "ContainerImage",
        version: extract_version(image).to_string(),
        name: image.to_string(),
    }
}

/// Version is the substring after the final `:`; the whole string when
/// no `:` is present; `"unknown"` for an empty image.
pub fn extract_version(image: &str) -> &str {
    if image.is_empty() {
        return "unknown";
    }
    match image.rfind(':') {
        Some(idx) => &image[idx + 1..],
        None => image,
    }
}

/// The quick-sync pipeline: a single SYNC stage routing 100% now.
/// The application's quick-sync prune option rides along as the stage's
/// parameters.
pub fn build_quick_sync_stages(app: &ApplicationConfig) -> Vec<PipelineStage> {
    let params = app
        .quick_sync
        .as_ref()
        .map(|qs| json!({ "prune": qs.prune }));

    vec![PipelineStage {
        index: 0,
        name: STAGE_SYNC.to_string(),
        rollback: false,
        description: stage_description(STAGE_SYNC).to_string(),
        params,
    }]
}

/// Stamp requested stages with descriptions, preserving caller-supplied
/// ordering and indices verbatim. No reordering, no validation.
pub fn build_pipeline_sync_stages(requested: &[StageRequest]) -> Vec<PipelineStage> {
    requested
        .iter()
        .map(|rs| PipelineStage {
            index: rs.index,
            name: rs.name.clone(),
            rollback: rs.rollback,
            description: stage_description(&rs.name).to_string(),
            params: rs.params.clone(),
        })
        .collect()
}
