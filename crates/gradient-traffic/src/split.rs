//! Traffic-split computation.
//!
//! Pure allocation logic: every function here maps inputs to a
//! fully-specified target state (never a relative delta), which is what
//! makes the surrounding stage operations safely repeatable.

use gradient_core::types::{Revision, TrafficTarget};

use crate::error::TrafficError;

/// Validate a promote percentage and narrow it to `u32`.
pub fn validate_percent(percent: i64) -> Result<u32, TrafficError> {
    if !(0..=100).contains(&percent) {
        return Err(TrafficError::InvalidPercent(percent));
    }
    Ok(percent as u32)
}

/// Sort revisions newest-first by creation time.
pub fn sort_newest_first(revisions: &mut [Revision]) {
    revisions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Compute the promote allocation for `percent` toward the latest revision.
///
/// With fewer than two revisions there is nothing to split against, so
/// the allocation falls back to 100% latest regardless of `percent`.
/// Otherwise the remainder goes to the second-newest revision by creation
/// time. "Previous" is always creation-time-second, never derived from
/// current traffic weights.
pub fn promote_allocation(percent: u32, revisions: &[Revision]) -> Vec<TrafficTarget> {
    if percent == 100 || revisions.len() < 2 {
        return vec![TrafficTarget::Latest { percent: 100 }];
    }

    let mut sorted: Vec<Revision> = revisions.to_vec();
    sort_newest_first(&mut sorted);
    let previous = sorted[1].name.clone();

    vec![
        TrafficTarget::Latest { percent },
        TrafficTarget::Revision {
            revision: previous,
            percent: 100 - percent,
        },
    ]
}

/// Compute a rollback allocation: 100% pinned to the named revision.
///
/// Never a latest target, since latest may itself be the broken revision.
pub fn rollback_allocation(revision: &str) -> Vec<TrafficTarget> {
    vec![TrafficTarget::Revision {
        revision: revision.to_string(),
        percent: 100,
    }]
}
