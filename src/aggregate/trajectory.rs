//! Approximate 1-D trajectory reconstruction from discrete actions.
//!
//! This is a visualization heuristic, not a physics replay: the step size and
//! bounds are tuned by eye against recorded Breakout paddles.

use serde::{Deserialize, Serialize};

use super::policy::Action;

/// Step size and symmetric bound of the reconstructed position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryParams {
    /// Distance moved per `Right`/`Left` action.
    pub step: f64,
    /// Position is clamped to `[-bound, bound]`.
    pub bound: f64,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            step: 4.0,
            bound: 72.0,
        }
    }
}

/// Scans an action sequence into positions, one per action.
///
/// Starts at `0`; `Right` decreases the position, `Left` increases it, and
/// `NoOp`, `Fire` and unknown codes leave it unchanged.
#[must_use]
pub fn reconstruct_trajectory(actions: &[usize], params: TrajectoryParams) -> Vec<f64> {
    let bound = params.bound.abs();
    let step = params.step.abs();
    actions
        .iter()
        .scan(0.0f64, |pos, &code| {
            match Action::from_index(code) {
                Some(Action::Right) => *pos = (*pos - step).max(-bound),
                Some(Action::Left) => *pos = (*pos + step).min(bound),
                Some(Action::NoOp | Action::Fire) | None => {}
            }
            Some(*pos)
        })
        .collect()
}
