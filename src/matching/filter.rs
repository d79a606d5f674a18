//! Distance-ranked correspondence filtering.
//!
//! Candidates are stably sorted by ascending distance (ties keep matcher
//! order) and the best `floor(count * retain_fraction / 100)` are kept.

use crate::matching::Correspondence;
use crate::util::{DocAlignError, DocAlignResult};

/// Fewest correspondences that can constrain a planar homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Number of correspondences kept out of `count` for a percentage in `[0, 100]`.
///
/// Truncates toward zero.
pub fn retained_count(count: usize, retain_fraction: f64) -> DocAlignResult<usize> {
    if !retain_fraction.is_finite() || !(0.0..=100.0).contains(&retain_fraction) {
        return Err(DocAlignError::InvalidConfig(
            "retain_fraction must be within [0, 100]",
        ));
    }
    let kept = (count as f64 * retain_fraction / 100.0).floor() as usize;
    Ok(kept.min(count))
}

/// Sorts candidates by distance and keeps the best `retain_fraction` percent.
pub fn retain_best(
    mut candidates: Vec<Correspondence>,
    retain_fraction: f64,
) -> DocAlignResult<Vec<Correspondence>> {
    let keep = retained_count(candidates.len(), retain_fraction)?;
    candidates.sort_by_key(|c| c.distance);
    candidates.truncate(keep);
    Ok(candidates)
}

/// Fails with [`DocAlignError::InsufficientCorrespondences`] below the minimum.
pub fn require_minimum(retained: &[Correspondence]) -> DocAlignResult<()> {
    if retained.len() < MIN_CORRESPONDENCES {
        return Err(DocAlignError::InsufficientCorrespondences {
            retained: retained.len(),
        });
    }
    Ok(())
}
