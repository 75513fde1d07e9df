//! Chart builders.
//!
//! Pure functions from aggregated data to chart descriptions. Chart ids double
//! as the event source ids of clicks on those charts.

use crate::aggregate::{
    action_column, cumulative_sum, entropy_series, rolling_stats, FrameSelection, Quadrant, RegionSeries,
    SnapshotSummary,
};
use crate::chart::{Axis, ChartDescription, Color, Series, SeriesKind, SeriesStyle};
use crate::training_log::TrainingLog;

pub const REGIONS: &str = "regions-chart";
pub const POLICY: &str = "policy-chart";
pub const ENTROPY: &str = "entropy-chart";
pub const REWARD: &str = "reward-chart";
pub const TRAJECTORY: &str = "trajectory-chart";
pub const OVERLAY: &str = "overlay-chart";
pub const SUMMARY: &str = "summary-chart";
pub const COMPARE_LEFT: &str = "compare-left-chart";
pub const COMPARE_RIGHT: &str = "compare-right-chart";
pub const REWARD_CURVE: &str = "reward-curve-chart";
pub const LOSS_CURVE: &str = "loss-curve-chart";

/// Name of the series marking the selected frame.
pub const SELECTED_FRAME: &str = "Selected frame";

/// Vertical line at `frame` spanning `[lo, hi]`.
#[allow(clippy::cast_precision_loss)]
fn frame_marker(frame: i64, lo: f64, hi: f64) -> Series {
    let x = frame as f64;
    Series::new(
        SELECTED_FRAME,
        [(x, lo), (x, hi)],
        SeriesStyle::new(SeriesKind::Line).color(Color::NEUTRAL),
    )
}

/// 2×2 panel of actor and critic regional intensities.
#[must_use]
pub fn regions(actor: &RegionSeries, critic: &RegionSeries, frame: i64) -> ChartDescription {
    let mut chart = ChartDescription::new(REGIONS, "Saliency intensity by quarter region")
        .x_axis(Axis::titled("Frame"))
        .y_axis(Axis::titled("Intensity").range(0.0, 1.0))
        .subplot_titles(Quadrant::ALL.map(Quadrant::label))
        .clickable();

    for q in Quadrant::ALL {
        let (row, col) = q.subplot();
        chart.push(Series::indexed(
            format!("Actor {}", q.label().to_lowercase()),
            actor.quadrant(q),
            SeriesStyle::new(SeriesKind::Line).color(Color::ACTOR).subplot(row, col),
        ));
        chart.push(Series::indexed(
            format!("Critic {}", q.label().to_lowercase()),
            critic.quadrant(q),
            SeriesStyle::new(SeriesKind::Line).color(Color::CRITIC).subplot(row, col),
        ));
        let mut marker = frame_marker(frame, 0.0, 1.0);
        marker.style = marker.style.subplot(row, col);
        chart.push(marker);
    }
    chart
}

/// Stacked per-action probabilities.
#[must_use]
pub fn policy(policy: &[Vec<f64>], labels: &[String], frame: i64) -> ChartDescription {
    let actions = policy.iter().map(Vec::len).max().unwrap_or(0);
    let mut chart = ChartDescription::new(POLICY, "Action probabilities")
        .x_axis(Axis::titled("Frame"))
        .y_axis(Axis::titled("Probability").range(0.0, 1.0))
        .clickable();
    for a in 0..actions {
        let name = labels.get(a).cloned().unwrap_or_else(|| format!("action {a}"));
        chart.push(Series::indexed(
            name,
            &action_column(policy, a),
            SeriesStyle::new(SeriesKind::Area).stacked("one"),
        ));
    }
    chart.push(frame_marker(frame, 0.0, 1.0));
    chart
}

/// Per-frame policy entropy; the y axis spans `[0, ln actions]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn entropy(policy: &[Vec<f64>], actions: usize, frame: i64) -> ChartDescription {
    let upper = if actions > 1 { (actions as f64).ln() } else { 0.0 };
    ChartDescription::new(ENTROPY, "Policy entropy")
        .x_axis(Axis::titled("Frame"))
        .y_axis(Axis::titled("Entropy (nats)").range(0.0, upper))
        .clickable()
        .with_series(Series::indexed(
            "Entropy",
            &entropy_series(policy),
            SeriesStyle::new(SeriesKind::Line),
        ))
        .with_series(frame_marker(frame, 0.0, upper))
}

/// Per-frame reward, cumulative reward and trailing-window statistics.
#[must_use]
pub fn reward(rewards: &[f64], window: usize, frame: i64) -> ChartDescription {
    let cumulative = cumulative_sum(rewards);
    let stats = rolling_stats(rewards, window);
    let top = cumulative
        .iter()
        .chain(rewards)
        .copied()
        .fold(0.0f64, f64::max);

    ChartDescription::new(REWARD, "Reward")
        .x_axis(Axis::titled("Frame"))
        .y_axis(Axis::titled("Reward"))
        .clickable()
        .with_series(Series::indexed("Reward", rewards, SeriesStyle::new(SeriesKind::Bar)))
        .with_series(Series::indexed(
            "Cumulative reward",
            &cumulative,
            SeriesStyle::new(SeriesKind::Line).secondary(),
        ))
        .with_series(Series::indexed("Rolling mean", &stats.mean, SeriesStyle::new(SeriesKind::Line)))
        .with_series(Series::indexed("Rolling min", &stats.min, SeriesStyle::new(SeriesKind::Line)))
        .with_series(Series::indexed("Rolling max", &stats.max, SeriesStyle::new(SeriesKind::Line)))
        .with_series(frame_marker(frame, 0.0, top))
}

/// Reconstructed position over the episode.
#[must_use]
pub fn trajectory(positions: &[f64], bound: f64) -> ChartDescription {
    ChartDescription::new(TRAJECTORY, "Reconstructed paddle position")
        .x_axis(Axis::titled("Frame"))
        .y_axis(Axis::titled("Position").range(-bound, bound))
        .with_series(Series::indexed("Position", positions, SeriesStyle::new(SeriesKind::Line)))
}

/// Regional intensity at the frames of peak actor saliency.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn overlay(selection: &FrameSelection) -> ChartDescription {
    let mut chart = ChartDescription::new(OVERLAY, "Regions at peak actor saliency")
        .x_axis(Axis::titled("Frame"))
        .y_axis(Axis::titled("Relative intensity").range(0.0, 1.0))
        .subplot_titles(Quadrant::ALL.map(Quadrant::label));
    for q in Quadrant::ALL {
        let (row, col) = q.subplot();
        let points = selection
            .indices
            .iter()
            .zip(&selection.quadrants[q.index()])
            .map(|(&t, &v)| (t as f64, v));
        chart.push(Series::new(
            q.label(),
            points,
            SeriesStyle::new(SeriesKind::Markers).color(Color::ACTOR).subplot(row, col),
        ));
    }
    chart
}

/// Actor regional intensities of one snapshot, for side-by-side comparison.
#[must_use]
pub fn comparison(id: &str, snapshot: u32, actor: &RegionSeries) -> ChartDescription {
    let mut chart = ChartDescription::new(id, format!("Actor saliency by region, model iteration {snapshot}"))
        .x_axis(Axis::titled("Frame"))
        .y_axis(Axis::titled("Intensity").range(0.0, 1.0));
    for q in Quadrant::ALL {
        chart.push(Series::indexed(q.label(), actor.quadrant(q), SeriesStyle::new(SeriesKind::Line)));
    }
    chart
}

/// One point per snapshot. Clicking selects the snapshot.
#[must_use]
pub fn summary(summaries: &[SnapshotSummary]) -> ChartDescription {
    let points = |f: fn(&SnapshotSummary) -> f64| -> Vec<(f64, f64)> {
        summaries
            .iter()
            .map(|s| (f64::from(s.snapshot.get()), f(s)))
            .collect()
    };

    ChartDescription::new(SUMMARY, "Model iterations")
        .x_axis(Axis::titled("Model iteration"))
        .y_axis(Axis::titled("Total reward"))
        .clickable()
        .with_series(Series::new(
            "Total reward",
            points(|s| s.total_reward),
            SeriesStyle::new(SeriesKind::Bar),
        ))
        .with_series(Series::new(
            "Mean actor saliency",
            points(|s| s.mean_actor_saliency),
            SeriesStyle::new(SeriesKind::Line).color(Color::ACTOR).secondary(),
        ))
        .with_series(Series::new(
            "Mean critic saliency",
            points(|s| s.mean_critic_saliency),
            SeriesStyle::new(SeriesKind::Line).color(Color::CRITIC).secondary(),
        ))
        .with_series(Series::new(
            "Mean entropy",
            points(|s| s.mean_entropy),
            SeriesStyle::new(SeriesKind::Markers).secondary(),
        ))
}

/// Training curves: mean episode reward and loss against frames.
#[must_use]
pub fn training_curves(log: Option<&TrainingLog>) -> (ChartDescription, ChartDescription) {
    let series = |column: &str| log.map(|l| l.series("frames", column)).unwrap_or_default();
    let reward = ChartDescription::new(REWARD_CURVE, "mean episode rewards over episodes")
        .x_axis(Axis::titled("500k Frames"))
        .y_axis(Axis::titled("Mean reward"))
        .with_series(Series::new("mean-epr", series("mean-epr"), SeriesStyle::new(SeriesKind::Line)));
    let loss = ChartDescription::new(LOSS_CURVE, "loss over episodes")
        .x_axis(Axis::titled("500k Frames"))
        .y_axis(Axis::titled("Loss"))
        .with_series(Series::new("run-loss", series("run-loss"), SeriesStyle::new(SeriesKind::Line)));
    (reward, loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::SnapshotId;

    #[test]
    fn test_regions_chart_layout() {
        let mut actor = RegionSeries::default();
        actor.quadrants = [vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0], vec![0.0, 0.0]];
        actor.totals = vec![2.0, 3.0];
        let chart = regions(&actor, &RegionSeries::default(), 1);
        assert_eq!(chart.id, REGIONS);
        assert!(chart.layout.click_enabled);
        assert_eq!(chart.layout.y_axis.range, Some((0.0, 1.0)));
        assert_eq!(chart.layout.subplot_titles.len(), 4);
        // Actor, critic and marker per quadrant.
        assert_eq!(chart.series.len(), 12);
        let top_left = chart.series_named("Actor top left").unwrap();
        assert_eq!(top_left.style.color, Some(Color::ACTOR));
        assert_eq!(top_left.style.subplot, Some((1, 1)));
        assert_eq!(chart.series_named(SELECTED_FRAME).unwrap().points[0].0, 1.0);
    }

    #[test]
    fn test_policy_chart_stacks_actions() {
        let labels: Vec<String> = ["NOOP", "FIRE"].iter().map(ToString::to_string).collect();
        let chart = policy(&[vec![0.25, 0.75], vec![0.5, 0.5]], &labels, 0);
        let fire = chart.series_named("FIRE").unwrap();
        assert_eq!(fire.style.stack_group.as_deref(), Some("one"));
        assert_eq!(fire.points, vec![(0.0, 0.75), (1.0, 0.5)]);
    }

    #[test]
    fn test_reward_chart_cumulative_matches_total() {
        let rewards = vec![0.0, 1.0, 0.0, 2.0];
        let chart = reward(&rewards, 2, 0);
        let cumulative = chart.series_named("Cumulative reward").unwrap();
        assert_eq!(cumulative.points.last(), Some(&(3.0, 3.0)));
        assert_eq!(cumulative.style.axis, crate::chart::AxisSide::Secondary);
    }

    #[test]
    fn test_summary_chart_x_is_snapshot() {
        let summaries = vec![SnapshotSummary {
            snapshot: SnapshotId(30),
            episode_length: 10,
            mean_actor_saliency: 1.0,
            mean_critic_saliency: 2.0,
            total_reward: 4.0,
            mean_entropy: 0.5,
            available: true,
        }];
        let chart = summary(&summaries);
        assert_eq!(chart.series_named("Total reward").unwrap().points, vec![(30.0, 4.0)]);
    }

    #[test]
    fn test_training_curves_without_log_are_empty() {
        let (reward, loss) = training_curves(None);
        assert!(reward.series[0].is_empty());
        assert_eq!(loss.layout.x_axis.title.as_deref(), Some("500k Frames"));
    }

    #[test]
    fn test_entropy_axis_upper_bound() {
        let chart = entropy(&[vec![0.25; 4]], 4, 0);
        let (_, hi) = chart.layout.y_axis.range.unwrap();
        assert!((hi - 4f64.ln()).abs() < 1e-12);
    }
}
