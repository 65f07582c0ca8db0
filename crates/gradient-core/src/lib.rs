//! gradient-core — domain model and configuration for the gradient
//! deployment engine.
//!
//! # Components
//!
//! - **`types`** — Service/Revision/TrafficTarget domain model
//! - **`config`** — application and deploy-target configuration (TOML)
//! - **`manifest`** — JSON service-manifest loading and overrides

pub mod config;
pub mod manifest;
pub mod types;

pub use config::{
    ApplicationConfig, DeployTargetConfig, InputConfig, PipelineSpec, QuickSyncConfig, StageDecl,
};
pub use manifest::ManifestError;
pub use types::*;
