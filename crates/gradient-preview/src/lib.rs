//! gradient-preview — read-only plan preview for deployments.
//!
//! Compares a desired service spec against the live one without
//! executing anything, so a host can show what a sync would change.
//!
//! # Components
//!
//! - **`diff`** — independent image/traffic/resources/scaling comparators
//! - **`plan`** — manifest loading and the create/update plan driver

pub mod diff;
pub mod plan;

pub use diff::{plan_create, plan_update, PlanPreviewResult};
pub use plan::{plan_for_target, PreviewError, PreviewResult};
