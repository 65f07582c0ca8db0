//! Stage vocabulary and per-stage configuration.
//!
//! The four stage names below form the declared capability set a host
//! uses to build pipelines. Stage parameters arrive as schema-less JSON
//! and are decoded here into a tagged union, one schema per stage name;
//! unknown stage names never reach parameter decoding.

use serde::Deserialize;

use crate::error::StageError;

/// Deploy a new revision and decide initial traffic exposure.
pub const STAGE_SYNC: &str = "SYNC";

/// Shift traffic toward the most recently deployed revision.
pub const STAGE_PROMOTE: &str = "PROMOTE";

/// Route 100% of traffic to a known-good revision.
pub const STAGE_ROLLBACK: &str = "ROLLBACK";

/// Remove old revisions that no longer receive traffic.
pub const STAGE_CANARY_CLEANUP: &str = "CANARY_CLEANUP";

/// The stages this engine can execute, in declaration order.
pub fn defined_stages() -> [&'static str; 4] {
    [
        STAGE_SYNC,
        STAGE_PROMOTE,
        STAGE_ROLLBACK,
        STAGE_CANARY_CLEANUP,
    ]
}

/// Human-readable description for a stage name, for UI display.
pub fn stage_description(stage_name: &str) -> &'static str {
    match stage_name {
        STAGE_SYNC => "Deploy a new revision",
        STAGE_PROMOTE => "Promote the new revision by adjusting traffic split",
        STAGE_ROLLBACK => "Rollback to the previous revision",
        STAGE_CANARY_CLEANUP => "Clean up canary revisions",
        _ => "Unknown stage",
    }
}

/// Configuration for the SYNC stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Keep the existing traffic allocation instead of routing 100% to
    /// the new revision.
    #[serde(default)]
    pub skip_traffic_shift: bool,
    /// Remove unused revisions after the deploy, best-effort.
    #[serde(default)]
    pub prune: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            skip_traffic_shift: false,
            prune: false,
        }
    }
}

/// Configuration for the PROMOTE stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromoteConfig {
    /// Percentage of traffic to route to the latest revision (0-100).
    /// Kept wide here so out-of-range values fail validation, not decoding.
    #[serde(default = "default_percent")]
    pub percent: i64,
}

impl Default for PromoteConfig {
    fn default() -> Self {
        Self {
            percent: default_percent(),
        }
    }
}

fn default_percent() -> i64 {
    100
}

/// Configuration for the ROLLBACK stage.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RollbackConfig {
    /// Revision to roll back to. Empty means the previous revision.
    #[serde(default)]
    pub revision: String,
}

/// Configuration for the CANARY_CLEANUP stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    /// Number of recent revisions to always keep.
    #[serde(default = "default_keep_count")]
    pub keep_count: usize,
    /// Always keep the current template revision.
    #[serde(default = "default_keep_latest")]
    pub keep_latest: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            keep_count: default_keep_count(),
            keep_latest: default_keep_latest(),
        }
    }
}

fn default_keep_count() -> usize {
    5
}

fn default_keep_latest() -> bool {
    true
}

/// Decoded per-stage configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum StageConfig {
    Sync(SyncConfig),
    Promote(PromoteConfig),
    Rollback(RollbackConfig),
    CanaryCleanup(CleanupConfig),
}

/// Decode stage parameters against the named stage's schema.
///
/// Missing or null parameters yield the stage's defaults. Unknown stage
/// names are rejected here, before any parameter decoding.
pub fn decode_stage_config(
    stage_name: &str,
    params: Option<&serde_json::Value>,
) -> Result<StageConfig, StageError> {
    match stage_name {
        STAGE_SYNC => Ok(StageConfig::Sync(decode(stage_name, params)?)),
        STAGE_PROMOTE => Ok(StageConfig::Promote(decode(stage_name, params)?)),
        STAGE_ROLLBACK => Ok(StageConfig::Rollback(decode(stage_name, params)?)),
        STAGE_CANARY_CLEANUP => Ok(StageConfig::CanaryCleanup(decode(stage_name, params)?)),
        other => Err(StageError::UnsupportedStage(other.to_string())),
    }
}

fn decode<T: Default + serde::de::DeserializeOwned>(
    stage_name: &str,
    params: Option<&serde_json::Value>,
) -> Result<T, StageError> {
    match params {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            StageError::Config(format!("invalid {stage_name} stage config: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defined_stages_in_order() {
        assert_eq!(
            defined_stages(),
            ["SYNC", "PROMOTE", "ROLLBACK", "CANARY_CLEANUP"]
        );
    }

    #[test]
    fn descriptions_cover_every_stage() {
        for stage in defined_stages() {
            assert_ne!(stage_description(stage), "Unknown stage");
        }
        assert_eq!(stage_description("WAIT"), "Unknown stage");
    }

    #[test]
    fn missing_params_decode_to_defaults() {
        let cfg = decode_stage_config(STAGE_PROMOTE, None).unwrap();
        assert_eq!(cfg, StageConfig::Promote(PromoteConfig { percent: 100 }));

        let cfg = decode_stage_config(STAGE_CANARY_CLEANUP, None).unwrap();
        assert_eq!(
            cfg,
            StageConfig::CanaryCleanup(CleanupConfig {
                keep_count: 5,
                keep_latest: true,
            })
        );

        let cfg = decode_stage_config(STAGE_SYNC, None).unwrap();
        assert_eq!(
            cfg,
            StageConfig::Sync(SyncConfig {
                skip_traffic_shift: false,
                prune: false,
            })
        );

        let cfg = decode_stage_config(STAGE_ROLLBACK, None).unwrap();
        assert_eq!(cfg, StageConfig::Rollback(RollbackConfig::default()));
    }

    #[test]
    fn explicit_params_decode() {
        let cfg = decode_stage_config(
            STAGE_SYNC,
            Some(&json!({"skip_traffic_shift": true, "prune": true})),
        )
        .unwrap();
        assert_eq!(
            cfg,
            StageConfig::Sync(SyncConfig {
                skip_traffic_shift: true,
                prune: true,
            })
        );

        let cfg =
            decode_stage_config(STAGE_PROMOTE, Some(&json!({"percent": 10}))).unwrap();
        assert_eq!(cfg, StageConfig::Promote(PromoteConfig { percent: 10 }));
    }

    #[test]
    fn out_of_range_percent_still_decodes() {
        // Range enforcement is the executor's job, not the decoder's.
        let cfg =
            decode_stage_config(STAGE_PROMOTE, Some(&json!({"percent": -1}))).unwrap();
        assert_eq!(cfg, StageConfig::Promote(PromoteConfig { percent: -1 }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = decode_stage_config(
            STAGE_PROMOTE,
            Some(&json!({"percent": 10, "steps": [1, 2]})),
        )
        .unwrap_err();
        assert!(matches!(err, StageError::Config(_)));
    }

    #[test]
    fn unknown_stage_rejected_before_decoding() {
        let err = decode_stage_config("WAIT", Some(&json!({"duration": "5m"}))).unwrap_err();
        assert!(matches!(err, StageError::UnsupportedStage(s) if s == "WAIT"));
    }
}
