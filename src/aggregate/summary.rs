//! Cross-snapshot summary scalars for top-level comparison charts.

use serde::{Deserialize, Serialize};

use super::entropy::entropy_series;
use crate::archive::{Array, RolloutRecord, SnapshotId};

/// Aggregate scalars of one snapshot's episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub snapshot: SnapshotId,
    /// Number of recorded frames.
    pub episode_length: usize,
    /// Mean over frames of the total actor saliency.
    pub mean_actor_saliency: f64,
    /// Mean over frames of the total critic saliency.
    pub mean_critic_saliency: f64,
    /// Sum of per-frame rewards.
    pub total_reward: f64,
    /// Mean per-frame policy entropy (nats).
    pub mean_entropy: f64,
    /// False if any field was replaced by a placeholder.
    pub available: bool,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / n as f64;
    if mean.is_finite() {
        mean
    } else {
        0.0
    }
}

/// Mean over frames of each frame's element sum.
#[must_use]
pub fn mean_frame_total(grids: &Array) -> f64 {
    mean(grids.frames().map(|f| f.iter().map(|&v| f64::from(v)).sum()))
}

/// Summarizes one episode record.
#[must_use]
pub fn summarize(record: &RolloutRecord) -> SnapshotSummary {
    let total_reward: f64 = record.reward.series_f64().iter().sum();
    SnapshotSummary {
        snapshot: record.snapshot,
        episode_length: record.len(),
        mean_actor_saliency: mean_frame_total(&record.actor_saliency),
        mean_critic_saliency: mean_frame_total(&record.critic_saliency),
        total_reward: if total_reward.is_finite() { total_reward } else { 0.0 },
        mean_entropy: mean(entropy_series(&record.policy.rows_f64()).into_iter()),
        available: record.is_complete(),
    }
}

/// Summaries for a fixed set of snapshots, in the given order.
#[must_use]
pub fn summarize_snapshots(records: &[RolloutRecord]) -> Vec<SnapshotSummary> {
    records.iter().map(summarize).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn record(snapshot: u32, rewards: Vec<f32>, actor: Array) -> RolloutRecord {
        let len = rewards.len();
        RolloutRecord {
            snapshot: SnapshotId(snapshot),
            episode: 0,
            frames: Arc::new(Array::zeros(vec![len, 2, 2, 3])),
            policy: Arc::new(Array::new(vec![len, 2], [0.5f32, 0.5].repeat(len)).unwrap()),
            reward: Arc::new(Array::from_series(rewards)),
            actor_saliency: Arc::new(actor.clone()),
            critic_saliency: Arc::new(actor),
            missing: Vec::new(),
        }
    }

    #[test]
    fn test_summary_scalars() {
        let actor = Array::from_frames(&[2, 2], &[vec![1.0; 4], vec![3.0; 4]]).unwrap();
        let s = summarize(&record(50, vec![1.0, 2.0], actor));
        assert_eq!(s.episode_length, 2);
        assert_eq!(s.total_reward, 3.0);
        assert_eq!(s.mean_actor_saliency, 8.0);
        assert!((s.mean_entropy - 2f64.ln()).abs() < 1e-6);
        assert!(s.available);
    }

    #[test]
    fn test_empty_episode_summary_is_zero() {
        let s = summarize(&record(1, vec![], Array::zeros(vec![0, 2, 2])));
        assert_eq!(s.episode_length, 0);
        assert_eq!(s.mean_actor_saliency, 0.0);
        assert_eq!(s.mean_entropy, 0.0);
    }

    #[test]
    fn test_summaries_keep_order() {
        let a = record(30, vec![1.0], Array::zeros(vec![1, 2, 2]));
        let b = record(10, vec![1.0], Array::zeros(vec![1, 2, 2]));
        let out = summarize_snapshots(&[a, b]);
        assert_eq!(out[0].snapshot, SnapshotId(30));
        assert_eq!(out[1].snapshot, SnapshotId(10));
    }
}
