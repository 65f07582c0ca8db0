//! Domain types for the gradient deployment engine.
//!
//! These types mirror the compute platform's "service → immutable revision
//! → weighted traffic split" model. The platform owns and persists Service
//! and Revision entities; the engine only reads and rewrites them, so every
//! type here is serializable for the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Revision-template annotation key for the minimum instance count.
pub const MIN_SCALE_ANNOTATION: &str = "scaling/minScale";

/// Revision-template annotation key for the maximum instance count.
pub const MAX_SCALE_ANNOTATION: &str = "scaling/maxScale";

// ── Coordinates ───────────────────────────────────────────────────

/// Fully-qualified coordinates of a service on the compute platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRef {
    pub project: String,
    pub region: String,
    pub service: String,
}

impl ServiceRef {
    pub fn new(project: &str, region: &str, service: &str) -> Self {
        Self {
            project: project.to_string(),
            region: region.to_string(),
            service: service.to_string(),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/regions/{}/services/{}",
            self.project, self.region, self.service
        )
    }
}

// ── Service ───────────────────────────────────────────────────────

/// A named, addressable deployable unit.
///
/// A service has exactly one mutable template; applying a new template
/// always produces exactly one new revision on the platform side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Short service name (unique within a project/region).
    pub name: String,
    /// Serving URL, assigned by the platform.
    #[serde(default)]
    pub uri: String,
    /// The mutable template a new revision is stamped from.
    pub template: RevisionTemplate,
    /// Weighted traffic targets. Weights always sum to exactly 100.
    #[serde(default)]
    pub traffic: Vec<TrafficTarget>,
    /// Platform-reported conditions.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Service {
    /// The service's `Ready` condition, if the platform has reported one.
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.kind == ConditionKind::Ready)
    }
}

/// The deployable template of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionTemplate {
    /// Name of the revision most recently stamped from this template.
    /// Platform-assigned; empty until the first apply.
    #[serde(default)]
    pub revision: String,
    pub containers: Vec<Container>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Scaling annotations (`scaling/minScale`, `scaling/maxScale`, ...).
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub container_concurrency: Option<u32>,
}

impl RevisionTemplate {
    /// Image of the first container, or empty when none is declared.
    pub fn first_image(&self) -> &str {
        self.containers.first().map(|c| c.image.as_str()).unwrap_or("")
    }
}

/// A single container within a revision template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub image: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub resources: Option<ResourceRequirements>,
}

/// Resource limits for a container, as platform-native strings
/// (`cpu = "1000m"`, `memory = "512Mi"`). No unit normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub limits: HashMap<String, String>,
}

// ── Revision ──────────────────────────────────────────────────────

/// An immutable, timestamped snapshot of a service's template.
///
/// Revisions are created by the platform as a side effect of applying a
/// service template and destroyed only by explicit deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Platform-assigned name, unique within the service.
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Unix timestamp (seconds) of creation.
    pub created_at: u64,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ── Traffic ───────────────────────────────────────────────────────

/// A weighted pointer to either the floating "latest" revision or a
/// pinned named revision.
///
/// A 0% target is legal: it represents a retained-but-inactive revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrafficTarget {
    /// Floating reference that always resolves to the template's revision.
    Latest { percent: u32 },
    /// Pinned reference to a named revision.
    Revision { revision: String, percent: u32 },
}

impl TrafficTarget {
    pub fn percent(&self) -> u32 {
        match self {
            TrafficTarget::Latest { percent } => *percent,
            TrafficTarget::Revision { percent, .. } => *percent,
        }
    }

    /// Stable key for allocation comparison: `"latest"` or the revision name.
    pub fn key(&self) -> &str {
        match self {
            TrafficTarget::Latest { .. } => "latest",
            TrafficTarget::Revision { revision, .. } => revision,
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, TrafficTarget::Latest { .. })
    }
}

/// Invariant violations in a traffic allocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("traffic weights sum to {0}, expected exactly 100")]
    BadSum(u32),

    #[error("allocation contains more than one latest target")]
    MultipleLatest,
}

/// Check the allocation invariants: weights sum to exactly 100 and at
/// most one `Latest` target exists.
pub fn validate_allocation(targets: &[TrafficTarget]) -> Result<(), AllocationError> {
    let sum: u32 = targets.iter().map(|t| t.percent()).sum();
    if sum != 100 {
        return Err(AllocationError::BadSum(sum));
    }
    if targets.iter().filter(|t| t.is_latest()).count() > 1 {
        return Err(AllocationError::MultipleLatest);
    }
    Ok(())
}

// ── Conditions ────────────────────────────────────────────────────

/// Kind of a platform condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Ready,
    ConfigurationsReady,
    RoutesReady,
}

/// State of a platform condition. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionState {
    Pending,
    Succeeded,
    Failed,
}

/// A platform-reported condition on a service or revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub state: ConditionState,
    #[serde(default)]
    pub message: String,
}

impl Condition {
    pub fn ready(state: ConditionState, message: &str) -> Self {
        Self {
            kind: ConditionKind::Ready,
            state,
            message: message.to_string(),
        }
    }
}
