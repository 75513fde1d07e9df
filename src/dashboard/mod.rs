//! The interactive rollout dashboard.
//!
//! Ties together the archive reader, the reactive graph and the interaction
//! router. One tick of UI events is routed into source-cell writes, which run
//! one wave; the cells that changed are then handed to a [`Renderer`].

pub mod charts;
mod context;
mod wiring;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::archive::{ArchiveStore, SnapshotId};
use crate::chart::ChartDescription;
use crate::config::DashboardConfig;
use crate::error::{ScopeError, ScopeResult};
use crate::graph::{CellValue, GraphEngine, WaveReport};
use crate::queue::{EventQueue, EventSender};
use crate::router::{EventTick, InteractionRouter, RouteOutcome};

pub use context::SessionContext;
pub use wiring::{build_graph, build_router, cells, controls};

/// Receives cell values to draw.
pub trait Renderer {
    /// Called once per changed cell; `value` is usually a chart, a text label
    /// or a frame.
    fn present(&mut self, cell: &str, value: &CellValue);
}

/// What one tick did.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub route: RouteOutcome,
    /// `None` when the tick produced no writes.
    pub wave: Option<WaveReport>,
}

impl DispatchReport {
    /// Cells written during the tick, first write order, without repeats.
    #[must_use]
    pub fn changed(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.wave
            .iter()
            .flat_map(|w| w.changed.iter())
            .map(String::as_str)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// True if the tick wrote nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.wave.is_none()
    }
}

/// A running dashboard session.
pub struct Dashboard {
    context: Arc<SessionContext>,
    engine: GraphEngine,
    router: InteractionRouter,
    queue: EventQueue,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("model_id", &self.context.config.model_id)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Validates `config`, builds the graph and populates every cell.
    ///
    /// # Errors
    ///
    /// A `Config` error for an invalid configuration, a `Graph` error if the
    /// graph cannot be built.
    pub fn new(config: DashboardConfig, store: Arc<dyn ArchiveStore>) -> ScopeResult<Self> {
        config.validate()?;
        let queue = EventQueue::bounded(config.event_queue_capacity);
        let context = Arc::new(SessionContext::new(config, store));
        let router = build_router(&context);
        let mut engine = build_graph(&context).build()?;

        let primed = engine.prime();
        info!(
            model_id = %context.config.model_id,
            computations = engine.computation_names().len(),
            primed = primed.executed.len(),
            "dashboard ready"
        );

        Ok(Self {
            context,
            engine,
            router,
            queue,
        })
    }

    /// Routes one tick and runs the resulting wave.
    ///
    /// # Errors
    ///
    /// Only a `Graph` error from the write itself; rejected events are listed
    /// in the report instead.
    pub fn dispatch(&mut self, tick: &EventTick) -> ScopeResult<DispatchReport> {
        let engine = &self.engine;
        let route = self
            .router
            .route(tick, |target| engine.value(target).and_then(CellValue::as_int));

        if route.is_empty() {
            debug!(events = tick.events.len(), dropped = route.dropped.len(), "tick produced no writes");
            return Ok(DispatchReport { route, wave: None });
        }

        let writes: Vec<(String, CellValue)> = route
            .writes
            .iter()
            .map(|(cell, v)| (cell.clone(), CellValue::Int(*v)))
            .collect();
        let wave = self.engine.write(writes)?;
        Ok(DispatchReport {
            route,
            wave: Some(wave),
        })
    }

    /// Dispatches every queued tick, oldest first.
    ///
    /// # Errors
    ///
    /// Stops at the first tick whose dispatch fails.
    pub fn pump(&mut self) -> ScopeResult<Vec<DispatchReport>> {
        let mut reports = Vec::new();
        while let Some(tick) = self.queue.try_recv() {
            reports.push(self.dispatch(&tick)?);
        }
        Ok(reports)
    }

    /// Hands every derived cell changed by `report` to `renderer`. Returns the
    /// number of cells presented.
    pub fn render_changed<R: Renderer + ?Sized>(&self, report: &DispatchReport, renderer: &mut R) -> usize {
        self.present(report.changed(), renderer)
    }

    /// Hands every derived cell to `renderer`, for the first paint.
    pub fn render_all<R: Renderer + ?Sized>(&self, renderer: &mut R) -> usize {
        self.present(self.engine.derived_cells(), renderer)
    }

    fn present<'a, R: Renderer + ?Sized>(&self, cells: impl IntoIterator<Item = &'a str>, renderer: &mut R) -> usize {
        let mut count = 0;
        for name in cells {
            let Some(cell) = self.engine.cell(name) else {
                continue;
            };
            if cell.is_source() {
                continue;
            }
            renderer.present(name, cell.value());
            count += 1;
        }
        count
    }

    /// Producer handle for UI ticks.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.queue.sender()
    }

    /// Current value of any cell.
    #[must_use]
    pub fn cell(&self, name: &str) -> Option<&CellValue> {
        self.engine.value(name)
    }

    /// Current chart held by a chart cell.
    #[must_use]
    pub fn chart(&self, name: &str) -> Option<&ChartDescription> {
        self.cell(name).and_then(CellValue::as_chart)
    }

    /// Selected frame index.
    #[must_use]
    pub fn frame(&self) -> i64 {
        self.cell(cells::SELECTED_FRAME).and_then(CellValue::as_int).unwrap_or(0)
    }

    /// Selected snapshot.
    ///
    /// # Errors
    ///
    /// `Internal` if the snapshot cell does not hold a valid snapshot id.
    pub fn snapshot(&self) -> ScopeResult<SnapshotId> {
        self.cell(cells::SELECTED_SNAPSHOT)
            .and_then(CellValue::as_int)
            .and_then(|v| u32::try_from(v).ok())
            .map(SnapshotId)
            .ok_or_else(|| ScopeError::internal("selected snapshot is not a snapshot id"))
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub const fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    #[must_use]
    pub const fn router(&self) -> &InteractionRouter {
        &self.router
    }
}
