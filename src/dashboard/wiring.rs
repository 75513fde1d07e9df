//! Cells, computations and router bindings of the dashboard.

use std::sync::Arc;

use super::charts;
use super::context::SessionContext;
use crate::aggregate::{
    argmax_actions, reconstruct_trajectory, regional_intensity, select_frames, summarize_snapshots,
};
use crate::archive::{Field, SnapshotId};
use crate::error::GraphError;
use crate::graph::{CellValue, Computation, GraphBuilder};
use crate::router::{Binding, ControlDomain, InteractionRouter};

/// Cell names.
#[allow(missing_docs)]
pub mod cells {
    pub const SELECTED_FRAME: &str = "selected_frame";
    pub const SELECTED_SNAPSHOT: &str = "selected_snapshot";
    pub const COMPARE_LEFT_SNAPSHOT: &str = "compare_left_snapshot";
    pub const COMPARE_RIGHT_SNAPSHOT: &str = "compare_right_snapshot";

    pub const FRAME_LABEL: &str = "frame_label";
    pub const SNAPSHOT_LABEL: &str = "snapshot_label";
    pub const ACTOR_REGIONS: &str = "actor_regions";
    pub const CRITIC_REGIONS: &str = "critic_regions";
    pub const ACTOR_TOTALS: &str = "actor_totals";
    pub const POLICY: &str = "policy";
    pub const REWARDS: &str = "rewards";
    pub const SCREEN: &str = "screen";
    pub const REGIONS_CHART: &str = "regions_chart";
    pub const POLICY_CHART: &str = "policy_chart";
    pub const ENTROPY_CHART: &str = "entropy_chart";
    pub const REWARD_CHART: &str = "reward_chart";
    pub const TRAJECTORY_CHART: &str = "trajectory_chart";
    pub const OVERLAY_CHART: &str = "overlay_chart";
    pub const COMPARE_LEFT_CHART: &str = "compare_left_chart";
    pub const COMPARE_RIGHT_CHART: &str = "compare_right_chart";
    pub const SUMMARY_CHART: &str = "summary_chart";
    pub const REWARD_CURVE_CHART: &str = "reward_curve_chart";
    pub const LOSS_CURVE_CHART: &str = "loss_curve_chart";
}

/// Event source ids of the non-chart controls.
#[allow(missing_docs)]
pub mod controls {
    pub const FRAME_SLIDER: &str = "frame-slider";
    pub const SNAPSHOT_SLIDER: &str = "snapshot-slider";
    pub const STEP_BACK: &str = "step-back";
    pub const STEP_FORWARD: &str = "step-forward";
    pub const COMPARE_LEFT_DROPDOWN: &str = "compare-left-dropdown";
    pub const COMPARE_RIGHT_DROPDOWN: &str = "compare-right-dropdown";
}

fn snapshot_of(computation: &str, value: &CellValue) -> Result<SnapshotId, GraphError> {
    let raw = value
        .as_int()
        .ok_or_else(|| GraphError::failed(computation, "snapshot cell holds no integer"))?;
    u32::try_from(raw)
        .map(SnapshotId)
        .map_err(|_| GraphError::failed(computation, format!("snapshot {raw} out of range")))
}

fn frame_of(value: &CellValue) -> i64 {
    value.as_int().unwrap_or(0)
}

fn regions_of(value: &CellValue) -> crate::aggregate::RegionSeries {
    value.as_regions().cloned().unwrap_or_default()
}

fn chart(description: crate::chart::ChartDescription) -> CellValue {
    CellValue::Chart(description)
}

/// Registers every source cell and computation.
#[must_use]
pub fn build_graph(ctx: &Arc<SessionContext>) -> GraphBuilder {
    let config = &ctx.config;
    let first = config.snapshots.first().copied().unwrap_or(config.default_snapshot);
    let last = config.snapshots.last().copied().unwrap_or(config.default_snapshot);

    GraphBuilder::new()
        .source_cell(cells::SELECTED_FRAME, CellValue::Int(config.frame_control.min))
        .source_cell(cells::SELECTED_SNAPSHOT, CellValue::Int(i64::from(config.default_snapshot)))
        .source_cell(cells::COMPARE_LEFT_SNAPSHOT, CellValue::Int(i64::from(first)))
        .source_cell(cells::COMPARE_RIGHT_SNAPSHOT, CellValue::Int(i64::from(last)))
        .register(frame_label())
        .register(snapshot_label())
        .register(episode_series(Arc::clone(ctx)))
        .register(screen(Arc::clone(ctx)))
        .register(regions_chart())
        .register(policy_chart(Arc::clone(ctx)))
        .register(entropy_chart(Arc::clone(ctx)))
        .register(reward_chart(Arc::clone(ctx)))
        .register(trajectory_chart(Arc::clone(ctx)))
        .register(saliency_overlay(Arc::clone(ctx)))
        .register(comparison(
            "compare_left",
            cells::COMPARE_LEFT_SNAPSHOT,
            cells::COMPARE_LEFT_CHART,
            charts::COMPARE_LEFT,
            Arc::clone(ctx),
        ))
        .register(comparison(
            "compare_right",
            cells::COMPARE_RIGHT_SNAPSHOT,
            cells::COMPARE_RIGHT_CHART,
            charts::COMPARE_RIGHT,
            Arc::clone(ctx),
        ))
        .register(snapshot_summary(Arc::clone(ctx)))
        .register(training_curves(Arc::clone(ctx)))
}

/// Binds every source cell to its controls, highest priority first.
#[must_use]
pub fn build_router(ctx: &SessionContext) -> InteractionRouter {
    let config = &ctx.config;
    let snapshots: ControlDomain = config.snapshot_domain();

    InteractionRouter::new()
        .bind(
            Binding::new(cells::SELECTED_FRAME, config.frame_control.domain())
                .trigger(controls::FRAME_SLIDER)
                .trigger(charts::REGIONS)
                .trigger(charts::POLICY)
                .trigger(charts::ENTROPY)
                .trigger(charts::REWARD)
                .trigger(controls::STEP_BACK)
                .trigger(controls::STEP_FORWARD)
                .delta(config.frame_step_delta),
        )
        .bind(
            Binding::new(cells::SELECTED_SNAPSHOT, snapshots.clone())
                .trigger(controls::SNAPSHOT_SLIDER)
                .trigger(charts::SUMMARY),
        )
        .bind(Binding::new(cells::COMPARE_LEFT_SNAPSHOT, snapshots.clone()).trigger(controls::COMPARE_LEFT_DROPDOWN))
        .bind(Binding::new(cells::COMPARE_RIGHT_SNAPSHOT, snapshots).trigger(controls::COMPARE_RIGHT_DROPDOWN))
}

fn frame_label() -> Computation {
    Computation::builder("frame_label")
        .reads([cells::SELECTED_FRAME])
        .writes([cells::FRAME_LABEL])
        .compute(|inputs| {
            Ok(vec![CellValue::Text(format!(
                "Frame number of episode: {}",
                frame_of(inputs[0])
            ))])
        })
}

fn snapshot_label() -> Computation {
    Computation::builder("snapshot_label")
        .reads([cells::SELECTED_SNAPSHOT])
        .writes([cells::SNAPSHOT_LABEL])
        .compute(|inputs| {
            let snapshot = snapshot_of("snapshot_label", inputs[0])?;
            Ok(vec![CellValue::Text(format!(
                "Model iteration (500k frame increments): {snapshot}"
            ))])
        })
}

/// Loads the selected snapshot once and fans it out into per-frame series.
fn episode_series(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("episode_series")
        .reads([cells::SELECTED_SNAPSHOT])
        .writes([
            cells::ACTOR_REGIONS,
            cells::CRITIC_REGIONS,
            cells::ACTOR_TOTALS,
            cells::POLICY,
            cells::REWARDS,
        ])
        .compute(move |inputs| {
            let snapshot = snapshot_of("episode_series", inputs[0])?;
            let record = ctx.reader.record(snapshot, ctx.config.episode);
            let actor = regional_intensity(&record.actor_saliency);
            let critic = regional_intensity(&record.critic_saliency);
            let totals = actor.totals.clone();
            Ok(vec![
                CellValue::Regions(actor),
                CellValue::Regions(critic),
                CellValue::Series(totals),
                CellValue::Matrix(record.policy.rows_f64()),
                CellValue::Series(record.reward.series_f64()),
            ])
        })
}

/// Raw frame at the selected index; out-of-range indices show the blank frame.
fn screen(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("screen")
        .reads([cells::SELECTED_FRAME, cells::SELECTED_SNAPSHOT])
        .writes([cells::SCREEN])
        .compute(move |inputs| {
            let snapshot = snapshot_of("screen", inputs[1])?;
            let frames = ctx
                .reader
                .get_or_placeholder(snapshot, ctx.config.episode, Field::Frames)
                .array;
            let frame = usize::try_from(frame_of(inputs[0]))
                .ok()
                .and_then(|t| frames.frame_array(t))
                .or_else(|| ctx.reader.placeholders().for_field(Field::Frames).frame_array(0))
                .ok_or_else(|| GraphError::failed("screen", "placeholder frame is empty"))?;
            Ok(vec![CellValue::Frame(frame)])
        })
}

fn regions_chart() -> Computation {
    Computation::builder("regions_chart")
        .reads([cells::ACTOR_REGIONS, cells::CRITIC_REGIONS, cells::SELECTED_FRAME])
        .writes([cells::REGIONS_CHART])
        .compute(|inputs| {
            Ok(vec![chart(charts::regions(
                &regions_of(inputs[0]),
                &regions_of(inputs[1]),
                frame_of(inputs[2]),
            ))])
        })
}

fn policy_chart(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("policy_chart")
        .reads([cells::POLICY, cells::SELECTED_FRAME])
        .writes([cells::POLICY_CHART])
        .compute(move |inputs| {
            let policy = inputs[0].as_matrix().unwrap_or_default();
            Ok(vec![chart(charts::policy(
                policy,
                &ctx.config.action_labels,
                frame_of(inputs[1]),
            ))])
        })
}

fn entropy_chart(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("entropy_chart")
        .reads([cells::POLICY, cells::SELECTED_FRAME])
        .writes([cells::ENTROPY_CHART])
        .compute(move |inputs| {
            let policy = inputs[0].as_matrix().unwrap_or_default();
            let actions = policy
                .iter()
                .map(Vec::len)
                .max()
                .unwrap_or(ctx.config.placeholders.actions);
            Ok(vec![chart(charts::entropy(policy, actions, frame_of(inputs[1])))])
        })
}

fn reward_chart(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("reward_chart")
        .reads([cells::REWARDS, cells::SELECTED_FRAME])
        .writes([cells::REWARD_CHART])
        .compute(move |inputs| {
            let rewards = inputs[0].as_series().unwrap_or_default();
            Ok(vec![chart(charts::reward(
                rewards,
                ctx.config.window(),
                frame_of(inputs[1]),
            ))])
        })
}

fn trajectory_chart(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("trajectory_chart")
        .reads([cells::POLICY])
        .writes([cells::TRAJECTORY_CHART])
        .compute(move |inputs| {
            let policy = inputs[0].as_matrix().unwrap_or_default();
            let params = ctx.config.trajectory;
            let positions = reconstruct_trajectory(&argmax_actions(policy), params);
            Ok(vec![chart(charts::trajectory(&positions, params.bound.abs()))])
        })
}

fn saliency_overlay(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("saliency_overlay")
        .reads([cells::ACTOR_TOTALS, cells::ACTOR_REGIONS])
        .writes([cells::OVERLAY_CHART])
        .compute(move |inputs| {
            let totals = inputs[0].as_series().unwrap_or_default();
            let selection = select_frames(totals, &regions_of(inputs[1]), ctx.config.selection_fraction);
            Ok(vec![chart(charts::overlay(&selection))])
        })
}

fn comparison(
    name: &'static str,
    input: &'static str,
    output: &'static str,
    chart_id: &'static str,
    ctx: Arc<SessionContext>,
) -> Computation {
    Computation::builder(name)
        .reads([input])
        .writes([output])
        .compute(move |inputs| {
            let snapshot = snapshot_of(name, inputs[0])?;
            let saliency = ctx
                .reader
                .get_or_placeholder(snapshot, ctx.config.episode, Field::ActorSaliency)
                .array;
            let actor = regional_intensity(&saliency);
            Ok(vec![chart(charts::comparison(chart_id, snapshot.get(), &actor))])
        })
}

fn snapshot_summary(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("snapshot_summary")
        .writes([cells::SUMMARY_CHART])
        .compute(move |_| {
            let records: Vec<_> = ctx
                .config
                .snapshots
                .iter()
                .map(|&s| ctx.reader.record(SnapshotId(s), ctx.config.episode))
                .collect();
            Ok(vec![chart(charts::summary(&summarize_snapshots(&records)))])
        })
}

fn training_curves(ctx: Arc<SessionContext>) -> Computation {
    Computation::builder("training_curves")
        .writes([cells::REWARD_CURVE_CHART, cells::LOSS_CURVE_CHART])
        .compute(move |_| {
            let (reward, loss) = charts::training_curves(ctx.training_log.as_ref());
            Ok(vec![chart(reward), chart(loss)])
        })
}
