use std::io::Write as _;
use std::sync::Arc;

use rollscope::dashboard::{cells, charts, controls};
use rollscope::{
    ArchiveKey, Array, CellValue, Dashboard, DashboardConfig, EventKind, EventTick, Field, FrameControl,
    InMemoryArchive, PlaceholderShapes, Renderer, SnapshotId, UiEvent,
};

const MODEL: &str = "models_test";
const EPISODE_LEN: usize = 300;

/// Snapshot 50 holds a full episode; snapshot 10 is configured but absent.
fn archive() -> Arc<InMemoryArchive> {
    let archive = InMemoryArchive::new();
    let key = |field| ArchiveKey::new(MODEL, SnapshotId(50), 0, field);

    #[allow(clippy::cast_precision_loss)]
    let frames: Vec<Vec<f32>> = (0..EPISODE_LEN)
        .map(|t| {
            let mut f = vec![0.0; 4 * 4 * 3];
            f[0] = t as f32;
            f
        })
        .collect();
    archive
        .insert(key(Field::Frames), Array::from_frames(&[4, 4, 3], &frames).unwrap())
        .unwrap();

    let policy: Vec<Vec<f32>> = (0..EPISODE_LEN)
        .map(|t| {
            let mut row = vec![0.1; 4];
            row[t % 4] = 0.7;
            row
        })
        .collect();
    archive
        .insert(key(Field::Policy), Array::from_frames(&[4], &policy).unwrap())
        .unwrap();

    // All actor mass in the top-left cell; critic uniform.
    let actor: Vec<Vec<f32>> = (0..EPISODE_LEN)
        .map(|_| {
            let mut g = vec![0.0; 16];
            g[0] = 2.0;
            g
        })
        .collect();
    let critic: Vec<Vec<f32>> = vec![vec![1.0; 16]; EPISODE_LEN];
    archive
        .insert(key(Field::ActorSaliency), Array::from_frames(&[4, 4], &actor).unwrap())
        .unwrap();
    archive
        .insert(key(Field::CriticSaliency), Array::from_frames(&[4, 4], &critic).unwrap())
        .unwrap();

    let reward: Vec<f32> = (0..EPISODE_LEN).map(|t| if t % 10 == 0 { 1.0 } else { 0.0 }).collect();
    archive.insert(key(Field::Reward), Array::from_series(reward)).unwrap();

    Arc::new(archive)
}

fn config(step: i64) -> DashboardConfig {
    DashboardConfig {
        model_id: MODEL.to_string(),
        snapshots: vec![10, 50],
        default_snapshot: 50,
        frame_control: FrameControl {
            min: 0,
            max: 3000,
            step,
        },
        frame_step_delta: 5,
        placeholders: PlaceholderShapes {
            frame: vec![4, 4, 3],
            grid: [4, 4],
            actions: 4,
        },
        ..DashboardConfig::default()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dashboard() -> Dashboard {
    init_tracing();
    Dashboard::new(config(5), archive()).unwrap()
}

#[derive(Default)]
struct RecordingRenderer {
    presented: Vec<String>,
}

impl Renderer for RecordingRenderer {
    fn present(&mut self, cell: &str, _value: &CellValue) {
        self.presented.push(cell.to_string());
    }
}

#[test]
fn initial_state_is_fully_populated() {
    let d = dashboard();
    assert_eq!(d.frame(), 0);
    assert_eq!(d.snapshot().unwrap(), SnapshotId(50));
    assert_eq!(
        d.cell(cells::FRAME_LABEL).and_then(CellValue::as_text),
        Some("Frame number of episode: 0")
    );
    assert_eq!(
        d.cell(cells::SNAPSHOT_LABEL).and_then(CellValue::as_text),
        Some("Model iteration (500k frame increments): 50")
    );
    for chart in [
        cells::REGIONS_CHART,
        cells::POLICY_CHART,
        cells::ENTROPY_CHART,
        cells::REWARD_CHART,
        cells::TRAJECTORY_CHART,
        cells::OVERLAY_CHART,
        cells::COMPARE_LEFT_CHART,
        cells::COMPARE_RIGHT_CHART,
        cells::SUMMARY_CHART,
        cells::REWARD_CURVE_CHART,
        cells::LOSS_CURVE_CHART,
    ] {
        assert!(d.chart(chart).is_some(), "{chart} not populated");
    }
}

#[test]
fn cumulative_reward_ends_at_episode_total() {
    let d = dashboard();
    let rewards = d.cell(cells::REWARDS).and_then(CellValue::as_series).unwrap();
    assert_eq!(rewards.len(), EPISODE_LEN);
    let total: f64 = rewards.iter().sum();
    assert!((total - 30.0).abs() < 1e-9);

    let chart = d.chart(cells::REWARD_CHART).unwrap();
    let cumulative = chart.series_named("Cumulative reward").unwrap();
    assert_eq!(cumulative.len(), EPISODE_LEN);
    assert!((cumulative.points[EPISODE_LEN - 1].1 - total).abs() < 1e-9);
}

#[test]
fn non_finite_reward_does_not_abort_startup() {
    init_tracing();
    let archive = InMemoryArchive::new();
    archive
        .insert(
            ArchiveKey::new(MODEL, SnapshotId(50), 0, Field::Reward),
            Array::from_series(vec![f32::NAN, 1.0]),
        )
        .unwrap();
    let d = Dashboard::new(config(5), Arc::new(archive)).unwrap();

    let chart = d.chart(cells::REWARD_CHART).unwrap();
    let mean = chart.series_named("Rolling mean").unwrap();
    assert_eq!(mean.points, vec![(0.0, 0.0), (1.0, 0.5)]);
    let cumulative = chart.series_named("Cumulative reward").unwrap();
    assert_eq!(cumulative.points[1].1, 1.0);
}

#[test]
fn chart_click_snaps_and_updates_only_frame_dependents() {
    let mut d = dashboard();
    let report = d
        .dispatch(&EventTick::single(UiEvent::click(charts::REGIONS, 123.0)))
        .unwrap();
    assert_eq!(d.frame(), 125);

    let wave = report.wave.as_ref().unwrap();
    assert!(wave.failures.is_empty());
    assert!(wave.ran("regions_chart"));
    assert!(wave.ran("screen"));
    assert!(!wave.ran("episode_series"));
    assert!(!wave.ran("trajectory_chart"));

    let changed = report.changed();
    assert!(changed.contains(&cells::FRAME_LABEL));
    assert!(!changed.contains(&cells::OVERLAY_CHART));

    let screen = d.cell(cells::SCREEN).and_then(CellValue::as_frame).unwrap();
    assert_eq!(screen.shape(), &[1, 4, 4, 3]);
    assert!((screen.data()[0] - 125.0).abs() < f32::EPSILON);

    let marker = d
        .chart(cells::POLICY_CHART)
        .and_then(|c| c.series_named(charts::SELECTED_FRAME))
        .unwrap();
    assert!((marker.points[0].0 - 125.0).abs() < 1e-9);
}

#[test]
fn step_back_clamps_at_zero() {
    let mut d = Dashboard::new(config(1), archive()).unwrap();
    d.dispatch(&UiEvent::select(controls::FRAME_SLIDER, 2.0).into()).unwrap();
    assert_eq!(d.frame(), 2);
    d.dispatch(&UiEvent::step_back(controls::STEP_BACK).into()).unwrap();
    assert_eq!(d.frame(), 0);
    d.dispatch(&UiEvent::step_forward(controls::STEP_FORWARD).into()).unwrap();
    assert_eq!(d.frame(), 5);
}

#[test]
fn missing_snapshot_renders_placeholders() {
    let mut d = dashboard();
    let report = d
        .dispatch(&UiEvent::select(controls::SNAPSHOT_SLIDER, 10.0).into())
        .unwrap();
    assert!(report.wave.as_ref().unwrap().failures.is_empty());
    assert_eq!(d.snapshot().unwrap(), SnapshotId(10));

    let regions = d.chart(cells::REGIONS_CHART).unwrap();
    let top_left = regions.series_named("Actor top left").unwrap();
    assert_eq!(top_left.points, vec![(0.0, 0.0)]);

    let screen = d.cell(cells::SCREEN).and_then(CellValue::as_frame).unwrap();
    assert_eq!(screen.shape(), &[1, 4, 4, 3]);
    assert!(screen.data().iter().all(|&v| v == 0.0));

    let summary = d.chart(cells::SUMMARY_CHART).unwrap();
    let totals = summary.series_named("Total reward").unwrap();
    assert_eq!(totals.points, vec![(10.0, 0.0), (50.0, 30.0)]);
}

#[test]
fn out_of_domain_select_is_dropped() {
    let mut d = dashboard();
    let report = d
        .dispatch(&UiEvent::select(controls::FRAME_SLIDER, 5000.0).into())
        .unwrap();
    assert!(report.is_noop());
    assert_eq!(report.route.dropped.len(), 1);
    assert_eq!(d.frame(), 0);

    let report = d
        .dispatch(&UiEvent::select(controls::SNAPSHOT_SLIDER, 30.0).into())
        .unwrap();
    assert!(report.is_noop());
    assert_eq!(d.snapshot().unwrap(), SnapshotId(50));
}

#[test]
fn slider_outranks_chart_click_in_same_tick() {
    let mut d = dashboard();
    let tick = EventTick::new([
        UiEvent::click(charts::REWARD, 200.0),
        UiEvent::select(controls::FRAME_SLIDER, 40.0),
    ]);
    let report = d.dispatch(&tick).unwrap();
    assert_eq!(d.frame(), 40);
    assert_eq!(report.route.writes.len(), 1);
}

#[test]
fn empty_click_retains_current_frame() {
    let mut d = dashboard();
    let report = d
        .dispatch(&UiEvent::new(charts::ENTROPY, EventKind::ChartClick { x: None }).into())
        .unwrap();
    assert!(report.is_noop());
    assert!(report.route.dropped.is_empty());
}

#[test]
fn summary_click_selects_nearest_snapshot() {
    let mut d = dashboard();
    d.dispatch(&UiEvent::click(charts::SUMMARY, 12.0).into()).unwrap();
    assert_eq!(d.snapshot().unwrap(), SnapshotId(10));
}

#[test]
fn comparison_dropdowns_are_independent() {
    let mut d = dashboard();
    let report = d
        .dispatch(&UiEvent::select(controls::COMPARE_LEFT_DROPDOWN, 50.0).into())
        .unwrap();
    let wave = report.wave.unwrap();
    assert_eq!(wave.executed, vec!["compare_left".to_string()]);
    let title = &d.chart(cells::COMPARE_LEFT_CHART).unwrap().layout.title;
    assert!(title.ends_with("50"));
}

#[test]
fn pump_drains_queued_ticks_in_order() {
    let mut d = dashboard();
    let tx = d.sender();
    tx.send(UiEvent::select(controls::FRAME_SLIDER, 100.0)).unwrap();
    tx.send(UiEvent::step_forward(controls::STEP_FORWARD)).unwrap();
    let reports = d.pump().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(d.frame(), 105);
    assert!(d.pump().unwrap().is_empty());
}

#[test]
fn renderer_receives_derived_cells_only() {
    let mut d = dashboard();
    let mut renderer = RecordingRenderer::default();
    let painted = d.render_all(&mut renderer);
    assert_eq!(painted, d.engine().derived_cells().len());
    assert!(!renderer.presented.iter().any(|c| c == cells::SELECTED_FRAME));

    let report = d
        .dispatch(&UiEvent::click(charts::POLICY, 10.0).into())
        .unwrap();
    let mut renderer = RecordingRenderer::default();
    d.render_changed(&report, &mut renderer);
    assert!(renderer.presented.iter().any(|c| c == cells::POLICY_CHART));
    assert!(!renderer.presented.iter().any(|c| c == cells::SELECTED_FRAME));
    assert!(!renderer.presented.iter().any(|c| c == cells::SUMMARY_CHART));
}

#[test]
fn training_log_populates_curves() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "time, episodes, frames, mean-epr, run-loss").unwrap();
    writeln!(file, "1.0, 10, 500000, 0.5, 0.30").unwrap();
    writeln!(file, "2.0, 20, 1500000, 1.5, 0.10").unwrap();

    let config = DashboardConfig {
        training_log: Some(file.path().to_path_buf()),
        ..config(5)
    };
    let d = Dashboard::new(config, archive()).unwrap();
    let reward = d.chart(cells::REWARD_CURVE_CHART).unwrap();
    assert_eq!(reward.series[0].points, vec![(1.0, 0.5), (3.0, 1.5)]);
    let loss = d.chart(cells::LOSS_CURVE_CHART).unwrap();
    assert_eq!(loss.series[0].points, vec![(1.0, 0.30), (3.0, 0.10)]);
}

#[test]
fn invalid_config_is_fatal() {
    let config = DashboardConfig {
        default_snapshot: 99,
        ..config(5)
    };
    let err = Dashboard::new(config, archive()).unwrap_err();
    assert!(err.is_fatal());
}
