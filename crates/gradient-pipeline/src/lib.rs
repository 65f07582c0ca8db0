//! gradient-pipeline — deployment strategy, stage construction, and
//! stage execution.
//!
//! The host drives one deployment as: determine strategy → build the
//! stage list → execute each stage sequentially through the dispatcher.
//! On failure the host may execute the ROLLBACK stage next; the engine
//! never triggers a rollback on its own.
//!
//! # Components
//!
//! - **`planner`** — strategy selection, stage-list construction, versions
//! - **`dispatcher`** — routes a named stage request to its executor
//! - **`stages`** — stage vocabulary and per-stage config schemas
//! - **`sync` / `promote` / `rollback` / `cleanup`** — the four executors
//! - **`context`** — per-invocation coordinates and cancellation signal

pub mod cleanup;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod planner;
pub mod promote;
pub mod rollback;
pub mod stages;
pub mod sync;

#[cfg(test)]
mod testutil;

pub use context::{StageContext, StageOutcome};
pub use dispatcher::execute_stage;
pub use error::{StageError, StageResult};
pub use planner::{
    build_pipeline_sync_stages, build_quick_sync_stages, determine_strategy, determine_versions,
    extract_version, PipelineStage, StageRequest, SyncStrategy, VersionInfo,
};
pub use stages::{
    decode_stage_config, defined_stages, stage_description, CleanupConfig, PromoteConfig,
    RollbackConfig, StageConfig, SyncConfig, STAGE_CANARY_CLEANUP, STAGE_PROMOTE, STAGE_ROLLBACK,
    STAGE_SYNC,
};
