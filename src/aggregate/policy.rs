//! Policy distribution helpers: softmax, greedy actions, action labels.

use serde::{Deserialize, Serialize};

/// Discrete action of the recorded agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NoOp,
    Fire,
    Right,
    Left,
}

impl Action {
    /// Actions in policy-column order.
    pub const ALL: [Self; 4] = [Self::NoOp, Self::Fire, Self::Right, Self::Left];

    /// Maps a policy column index to an action. Unknown codes yield `None`.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::NoOp),
            1 => Some(Self::Fire),
            2 => Some(Self::Right),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoOp => "NOOP",
            Self::Fire => "FIRE",
            Self::Right => "RIGHT",
            Self::Left => "LEFT",
        }
    }
}

/// Row-wise softmax, shifted by the row maximum for stability.
///
/// Rows containing non-finite logits become uniform.
#[must_use]
pub fn softmax_rows(logits: &[Vec<f64>]) -> Vec<Vec<f64>> {
    logits.iter().map(|row| softmax(row)).collect()
}

fn softmax(row: &[f64]) -> Vec<f64> {
    if row.is_empty() {
        return Vec::new();
    }
    #[allow(clippy::cast_precision_loss)]
    let uniform = 1.0 / row.len() as f64;
    if row.iter().any(|v| !v.is_finite()) {
        return vec![uniform; row.len()];
    }
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = row.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 {
        return vec![uniform; row.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the most probable action per frame; ties go to the lowest index.
#[must_use]
pub fn argmax_actions(policy: &[Vec<f64>]) -> Vec<usize> {
    policy
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |(best, best_v), (i, &v)| {
                    if v > best_v {
                        (i, v)
                    } else {
                        (best, best_v)
                    }
                })
                .0
        })
        .collect()
}

/// Column `a` of a `[L, A]` policy, or zeros where a row is too short.
#[must_use]
pub fn action_column(policy: &[Vec<f64>], a: usize) -> Vec<f64> {
    policy.iter().map(|row| row.get(a).copied().unwrap_or(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let rows = softmax_rows(&[vec![1.0, 2.0, 3.0, 4.0], vec![1000.0, 0.0, -1000.0, 5.0]]);
        for row in rows {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_softmax_of_equal_logits_is_uniform() {
        let rows = softmax_rows(&[vec![3.0; 4]]);
        assert!(rows[0].iter().all(|p| (p - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_softmax_non_finite_row_is_uniform() {
        let rows = softmax_rows(&[vec![f64::NAN, 1.0]]);
        assert_eq!(rows[0], vec![0.5, 0.5]);
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        let actions = argmax_actions(&[vec![0.1, 0.7, 0.1, 0.1], vec![0.5, 0.5, 0.0, 0.0]]);
        assert_eq!(actions, vec![1, 0]);
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(Action::from_index(2), Some(Action::Right));
        assert_eq!(Action::from_index(9), None);
        assert_eq!(Action::Left.label(), "LEFT");
    }
}
