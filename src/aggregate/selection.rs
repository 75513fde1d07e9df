//! Threshold-based sparse frame selection.
//!
//! Picks the frames whose scalar value exceeds a fraction of the series
//! maximum and re-expresses their regional intensities relative to the
//! selected subset, for sparse overlay charts.

use serde::{Deserialize, Serialize};

use super::regions::RegionSeries;

/// Frames selected by [`select_frames`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSelection {
    /// Selected frame indices, ascending.
    pub indices: Vec<usize>,
    /// `quadrants[q][k]` is quadrant `q` at `indices[k]`, divided by that
    /// quadrant's maximum over the selected frames.
    pub quadrants: [Vec<f64>; 4],
}

impl FrameSelection {
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Indices whose value is strictly greater than `fraction * max(series)`.
///
/// Non-finite values are never selected.
#[must_use]
pub fn threshold_indices(series: &[f64], fraction: f64) -> Vec<usize> {
    let max = series
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Vec::new();
    }
    let threshold = fraction * max;
    series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite() && **v > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Selects frames of `series` above `fraction` of its maximum and renormalizes
/// the matching regional values by the selected subset's per-quadrant maximum.
///
/// Indices beyond the end of `regions` are dropped.
#[must_use]
pub fn select_frames(series: &[f64], regions: &RegionSeries, fraction: f64) -> FrameSelection {
    let indices: Vec<usize> = threshold_indices(series, fraction)
        .into_iter()
        .filter(|&t| t < regions.len())
        .collect();

    let mut quadrants: [Vec<f64>; 4] = Default::default();
    for (q, out) in quadrants.iter_mut().enumerate() {
        let picked: Vec<f64> = indices.iter().map(|&t| regions.quadrants[q][t]).collect();
        let subset_max = picked.iter().copied().fold(0.0f64, f64::max);
        *out = if subset_max > 0.0 {
            picked.into_iter().map(|v| v / subset_max).collect()
        } else {
            vec![0.0; picked.len()]
        };
    }

    FrameSelection { indices, quadrants }
}
