//! Stage execution context.
//!
//! The engine holds no durable state between stage invocations: each
//! executor reconstructs the coordinates it needs from this context and
//! the platform's current state on every call, which is what makes
//! retried stage calls safe.

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::watch;

use gradient_core::config::{ApplicationConfig, DeployTargetConfig};
use gradient_core::types::ServiceRef;

use crate::error::{StageError, StageResult};

/// Everything a stage executor needs for one invocation.
pub struct StageContext<'a> {
    pub app: &'a ApplicationConfig,
    pub target: &'a DeployTargetConfig,
    /// Directory the service manifest is resolved against.
    pub app_dir: &'a Path,
    /// Cancellation signal supplied by the host. Flipping it to `true`
    /// aborts the readiness wait with [`StageError::Cancelled`].
    pub cancel: watch::Receiver<bool>,
}

impl<'a> StageContext<'a> {
    pub fn new(
        app: &'a ApplicationConfig,
        target: &'a DeployTargetConfig,
        app_dir: &'a Path,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            app,
            target,
            app_dir,
            cancel,
        }
    }

    /// Effective project: input override, else the deploy target's.
    pub fn project(&self) -> &str {
        self.app.input.project.as_deref().unwrap_or(&self.target.project)
    }

    /// Effective region: input override, else the deploy target's.
    pub fn region(&self) -> &str {
        self.app.input.region.as_deref().unwrap_or(&self.target.region)
    }

    pub fn service_ref(&self, service: &str) -> ServiceRef {
        ServiceRef::new(self.project(), self.region(), service)
    }

    /// Service name for stages that run without a manifest in hand:
    /// the configured name, else the application name.
    pub fn service_name(&self) -> StageResult<String> {
        if let Some(name) = &self.app.input.service_name {
            if !name.is_empty() {
                return Ok(name.clone());
            }
        }
        if !self.app.name.is_empty() {
            return Ok(self.app.name.clone());
        }
        Err(StageError::Config(
            "service name not specified in config".to_string(),
        ))
    }
}

/// Result of a successful stage execution: a string-keyed metadata map
/// for UI display and downstream stage consumption.
#[derive(Debug, Default)]
pub struct StageOutcome {
    pub metadata: HashMap<String, String>,
}

impl StageOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Resolves when the cancellation signal flips to `true`. A dropped
/// sender counts as "never cancelled", not as a cancellation.
pub(crate) async fn cancelled(mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
