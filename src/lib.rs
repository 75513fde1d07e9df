//! # rollscope - Interactive inspection of recorded RL rollouts
//!
//! rollscope turns archived rollouts of a reinforcement-learning agent (frames,
//! policy, saliency maps and rewards per model snapshot) into linked charts.
//! Selecting a frame or a snapshot in one view updates every dependent view
//! through a small reactive dependency graph.
//!
//! ## Core Concepts
//!
//! - **Archive**: read-only array store keyed by model, snapshot, episode and field
//! - **Aggregation**: pure functions from raw arrays to chart-ready series
//! - **Graph**: source cells, derived cells and the computations between them
//! - **Router**: turns slider, button and chart-click events into source-cell writes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rollscope::{Dashboard, DashboardConfig, EventTick, InMemoryArchive, UiEvent};
//!
//! let store = Arc::new(InMemoryArchive::from_json_file("rollouts.json")?);
//! let mut dashboard = Dashboard::new(DashboardConfig::default(), store)?;
//!
//! let report = dashboard.dispatch(&EventTick::single(UiEvent::click("regions-chart", 123.0)))?;
//! assert_eq!(dashboard.frame(), 125);
//! dashboard.render_changed(&report, &mut renderer);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;

// Data access and aggregation
pub mod aggregate;
pub mod archive;
pub mod chart;
pub mod training_log;

// Reactive core
pub mod graph;
pub mod queue;
pub mod router;

// Application
pub mod config;
pub mod dashboard;

pub use aggregate::{Quadrant, RegionSeries, SnapshotSummary, TrajectoryParams};
pub use archive::{
    ArchiveError, ArchiveKey, ArchiveReader, ArchiveStore, Array, Field, InMemoryArchive, PlaceholderShapes,
    RolloutRecord, SnapshotId,
};
pub use chart::{ChartDescription, Series, SeriesKind, SeriesStyle};
pub use config::{DashboardConfig, FrameControl};
pub use dashboard::{Dashboard, DispatchReport, Renderer, SessionContext};
pub use error::{ConfigError, GraphError, LogError, RouterError, ScopeError, ScopeResult};
pub use graph::{CellValue, Computation, GraphBuilder, GraphEngine, WaveReport};
pub use queue::{EventQueue, EventSender};
pub use router::{Binding, ControlDomain, EventKind, EventTick, InteractionRouter, Resolution, UiEvent};
pub use training_log::TrainingLog;
