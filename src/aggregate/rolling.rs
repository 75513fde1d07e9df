//! Trailing-window statistics.
//!
//! The window ending at index `t` covers `[t + 1 - w, t]`, truncated to the
//! available prefix for `t < w - 1`. Every output at `t` depends only on
//! inputs at indices `<= t`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Rolling mean, min and max, all of the input's length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    pub window: usize,
    pub mean: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl RollingStats {
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Computes trailing-window statistics. A window of `0` is treated as `1`.
/// Non-finite inputs count as `0`.
///
/// Min and max use monotonic deques, so the whole pass is `O(L)`.
#[must_use]
pub fn rolling_stats(series: &[f64], window: usize) -> RollingStats {
    let series: Vec<f64> = series.iter().copied().map(finite_or_zero).collect();
    let w = window.max(1);
    let mut out = RollingStats {
        window: w,
        mean: Vec::with_capacity(series.len()),
        min: Vec::with_capacity(series.len()),
        max: Vec::with_capacity(series.len()),
    };

    // Indices with increasing values (front = min) and decreasing values (front = max).
    let mut min_q: VecDeque<usize> = VecDeque::new();
    let mut max_q: VecDeque<usize> = VecDeque::new();
    let mut sum = 0.0f64;

    for (t, &v) in series.iter().enumerate() {
        sum += v;
        if t >= w {
            sum -= series[t - w];
        }

        while min_q.back().is_some_and(|&i| series[i] >= v) {
            min_q.pop_back();
        }
        min_q.push_back(t);
        while max_q.back().is_some_and(|&i| series[i] <= v) {
            max_q.pop_back();
        }
        max_q.push_back(t);

        let start = (t + 1).saturating_sub(w);
        while min_q.front().is_some_and(|&i| i < start) {
            min_q.pop_front();
        }
        while max_q.front().is_some_and(|&i| i < start) {
            max_q.pop_front();
        }

        let count = t + 1 - start;
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / count as f64;
        let lo = min_q.front().map_or(v, |&i| series[i]);
        let hi = max_q.front().map_or(v, |&i| series[i]);
        // Floating error in the running sum must not push the mean outside [min, max].
        out.mean.push(mean.clamp(lo, hi));
        out.min.push(lo);
        out.max.push(hi);
    }
    out
}

/// Running total. Non-finite inputs count as `0`.
#[must_use]
pub fn cumulative_sum(series: &[f64]) -> Vec<f64> {
    series
        .iter()
        .scan(0.0f64, |acc, &v| {
            *acc += finite_or_zero(v);
            Some(*acc)
        })
        .collect()
}
