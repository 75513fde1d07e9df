//! Registration, validation and wave propagation.

use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::cmp::Reverse;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, trace, warn};
use uuid::Uuid;

use super::cell::{CellKind, CellValue, StateCell};
use super::computation::Computation;
use crate::error::GraphError;

/// Unique identifier for a propagation wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveId(Uuid);

impl WaveId {
    /// Create a new random wave id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WaveId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened during one wave.
#[derive(Debug, Clone)]
pub struct WaveReport {
    pub id: WaveId,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Cells written from outside the graph to start this wave.
    pub seeds: Vec<String>,
    /// Computations executed, in execution order.
    pub executed: Vec<String>,
    /// Every cell written during the wave (seeds included), in write order.
    pub changed: Vec<String>,
    /// Computations that failed; their outputs kept their previous values.
    pub failures: Vec<GraphError>,
}

impl WaveReport {
    fn start(seeds: Vec<String>) -> Self {
        Self {
            id: WaveId::new(),
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            changed: seeds.clone(),
            seeds,
            executed: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// True if `computation` ran during this wave.
    #[must_use]
    pub fn ran(&self, computation: &str) -> bool {
        self.executed.iter().any(|c| c == computation)
    }

    /// True if `cell` was written during this wave.
    #[must_use]
    pub fn touched(&self, cell: &str) -> bool {
        self.changed.iter().any(|c| c == cell)
    }
}

/// Collects source cells and computations before the engine starts.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    sources: Vec<(String, CellValue)>,
    computations: Vec<Computation>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a cell written from outside the graph.
    #[must_use]
    pub fn source_cell(mut self, name: impl Into<String>, initial: CellValue) -> Self {
        self.sources.push((name.into(), initial));
        self
    }

    /// Registers a computation. Its outputs become derived cells.
    #[must_use]
    pub fn register(mut self, computation: Computation) -> Self {
        self.computations.push(computation);
        self
    }

    /// Validates the registration and starts the engine.
    ///
    /// Static computations run once here, together with anything downstream
    /// of them.
    ///
    /// # Errors
    ///
    /// - `CycleDetected` if the cell/computation graph is not acyclic
    /// - `UnknownCell` if a computation reads a cell nobody declares
    /// - `DuplicateWriter`, `SourceCellIsDerived`, `DuplicateComputation` for
    ///   conflicting declarations
    pub fn build(self) -> Result<GraphEngine, GraphError> {
        let Self { sources, computations } = self;

        let mut names = HashSet::new();
        for c in &computations {
            if !names.insert(c.name().to_string()) {
                return Err(GraphError::DuplicateComputation {
                    name: c.name().to_string(),
                });
            }
        }

        let mut cells: HashMap<String, StateCell> = HashMap::new();
        for (name, initial) in sources {
            if cells.contains_key(&name) {
                return Err(GraphError::DuplicateWriter {
                    cell: name,
                    first: "external".to_string(),
                    second: "external".to_string(),
                });
            }
            cells.insert(name.clone(), StateCell::new(name, CellKind::Source, initial));
        }

        let mut producer_of: HashMap<String, usize> = HashMap::new();
        for (idx, c) in computations.iter().enumerate() {
            for out in c.outputs() {
                if let Some(existing) = cells.get(out) {
                    return Err(match existing.kind() {
                        CellKind::Source => GraphError::SourceCellIsDerived {
                            cell: out.clone(),
                            computation: c.name().to_string(),
                        },
                        CellKind::Derived { producer } => GraphError::DuplicateWriter {
                            cell: out.clone(),
                            first: producer.clone(),
                            second: c.name().to_string(),
                        },
                    });
                }
                cells.insert(
                    out.clone(),
                    StateCell::new(
                        out.clone(),
                        CellKind::Derived {
                            producer: c.name().to_string(),
                        },
                        CellValue::Empty,
                    ),
                );
                producer_of.insert(out.clone(), idx);
            }
        }

        for c in &computations {
            if let Some(missing) = c.inputs().iter().find(|i| !cells.contains_key(*i)) {
                return Err(GraphError::UnknownCell { name: missing.clone() });
            }
        }

        let order = topological_order(&computations, &producer_of)?;

        // Re-index computations by topological rank.
        let mut slots: Vec<Option<Computation>> = computations.into_iter().map(Some).collect();
        let computations: Vec<Computation> = order
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect();

        let mut consumers: HashMap<String, Vec<usize>> = HashMap::new();
        for (rank, c) in computations.iter().enumerate() {
            for input in c.inputs() {
                let list = consumers.entry(input.clone()).or_default();
                if !list.contains(&rank) {
                    list.push(rank);
                }
            }
        }

        let mut engine = GraphEngine {
            executions: vec![0; computations.len()],
            cells,
            computations,
            consumers,
            waves: 0,
            init_report: None,
        };

        info!(
            cells = engine.cells.len(),
            computations = engine.computations.len(),
            "reactive graph validated"
        );

        let statics: BTreeSet<usize> = engine
            .computations
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_static())
            .map(|(rank, _)| rank)
            .collect();
        let report = engine.run_wave(WaveReport::start(Vec::new()), statics);
        engine.init_report = Some(report);

        Ok(engine)
    }
}

/// Kahn's algorithm over computations. Ties are broken by registration order
/// so the resulting order is deterministic.
fn topological_order(
    computations: &[Computation],
    producer_of: &HashMap<String, usize>,
) -> Result<Vec<usize>, GraphError> {
    let n = computations.len();
    let mut indegree = vec![0usize; n];
    let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (idx, c) in computations.iter().enumerate() {
        let upstream: BTreeSet<usize> = c
            .inputs()
            .iter()
            .filter_map(|i| producer_of.get(i).copied())
            .collect();
        for up in upstream {
            downstream[up].push(idx);
            indegree[idx] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| indegree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(n);

    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &next in &downstream[idx] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < n {
        let computations = (0..n)
            .filter(|&i| indegree[i] > 0)
            .map(|i| computations[i].name().to_string())
            .collect();
        return Err(GraphError::CycleDetected { computations });
    }
    Ok(order)
}

/// The running dependency graph.
///
/// Computations are stored in topological order, so a computation's index is
/// also its rank: every producer of its inputs has a smaller index.
pub struct GraphEngine {
    cells: HashMap<String, StateCell>,
    computations: Vec<Computation>,
    consumers: HashMap<String, Vec<usize>>,
    executions: Vec<u64>,
    waves: u64,
    init_report: Option<WaveReport>,
}

impl fmt::Debug for GraphEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphEngine")
            .field("cells", &self.cells.len())
            .field("computations", &self.computation_names())
            .field("waves", &self.waves)
            .finish()
    }
}

impl GraphEngine {
    /// Writes source cells and propagates the change through the graph.
    ///
    /// The whole write set is validated before anything is applied.
    ///
    /// # Errors
    ///
    /// - `UnknownCell` for an undeclared cell
    /// - `NotASourceCell` for a cell owned by a computation
    /// - `DuplicateWriter` if the same cell appears twice in `writes`
    pub fn write<I, S>(&mut self, writes: I) -> Result<WaveReport, GraphError>
    where
        I: IntoIterator<Item = (S, CellValue)>,
        S: Into<String>,
    {
        let writes: Vec<(String, CellValue)> = writes.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut seen = HashSet::new();
        for (name, _) in &writes {
            let cell = self
                .cells
                .get(name)
                .ok_or_else(|| GraphError::UnknownCell { name: name.clone() })?;
            if !cell.is_source() {
                return Err(GraphError::NotASourceCell { name: name.clone() });
            }
            if !seen.insert(name.as_str()) {
                return Err(GraphError::DuplicateWriter {
                    cell: name.clone(),
                    first: "external".to_string(),
                    second: "external".to_string(),
                });
            }
        }

        let mut worklist = BTreeSet::new();
        let mut seeds = Vec::with_capacity(writes.len());
        for (name, value) in writes {
            if let Some(list) = self.consumers.get(&name) {
                worklist.extend(list.iter().copied());
            }
            if let Some(cell) = self.cells.get_mut(&name) {
                cell.set(value);
            }
            seeds.push(name);
        }

        Ok(self.run_wave(WaveReport::start(seeds), worklist))
    }

    /// Runs every computation downstream of a source cell once, as if every
    /// source had just been written. Used to populate outputs at startup.
    pub fn prime(&mut self) -> WaveReport {
        let worklist: BTreeSet<usize> = self
            .cells
            .values()
            .filter(|c| c.is_source())
            .filter_map(|c| self.consumers.get(c.name()))
            .flatten()
            .copied()
            .collect();
        self.run_wave(WaveReport::start(Vec::new()), worklist)
    }

    fn run_wave(&mut self, mut report: WaveReport, mut worklist: BTreeSet<usize>) -> WaveReport {
        self.waves += 1;
        let span = debug_span!("wave", id = %report.id, seeds = report.seeds.len());
        let _guard = span.enter();
        let started = Instant::now();
        let mut done = vec![false; self.computations.len()];

        while let Some(rank) = worklist.pop_first() {
            if std::mem::replace(&mut done[rank], true) {
                continue;
            }

            let computation = &self.computations[rank];
            let result = {
                let inputs: Vec<&CellValue> = computation
                    .inputs()
                    .iter()
                    .map(|name| self.cells.get(name).map_or(&CellValue::Empty, StateCell::value))
                    .collect();
                computation.call(&inputs)
            };
            self.executions[rank] += 1;
            report.executed.push(computation.name().to_string());
            trace!(computation = computation.name(), rank, "executed");

            let outputs = match result {
                Ok(outputs) if outputs.len() == computation.outputs().len() => outputs,
                Ok(outputs) => {
                    let err = GraphError::OutputArity {
                        computation: computation.name().to_string(),
                        expected: computation.outputs().len(),
                        actual: outputs.len(),
                    };
                    warn!(error = %err, "computation output rejected");
                    report.failures.push(err);
                    continue;
                }
                Err(err) => {
                    warn!(computation = computation.name(), error = %err, "computation failed");
                    report.failures.push(err);
                    continue;
                }
            };

            // All outputs are committed together, after the function returned.
            for (name, value) in computation.outputs().iter().zip(outputs) {
                if let Some(cell) = self.cells.get_mut(name) {
                    cell.set(value);
                }
                if let Some(list) = self.consumers.get(name) {
                    worklist.extend(list.iter().copied().filter(|&r| !done[r]));
                }
                report.changed.push(name.clone());
            }
        }

        report.elapsed = started.elapsed();
        debug!(
            executed = report.executed.len(),
            changed = report.changed.len(),
            failures = report.failures.len(),
            elapsed_us = u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
            "wave complete"
        );
        report
    }

    /// Current value of a cell.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&CellValue> {
        self.cells.get(name).map(StateCell::value)
    }

    #[must_use]
    pub fn cell(&self, name: &str) -> Option<&StateCell> {
        self.cells.get(name)
    }

    /// Version counter of a cell.
    #[must_use]
    pub fn version(&self, name: &str) -> Option<u64> {
        self.cells.get(name).map(StateCell::version)
    }

    /// How many times a computation has executed since the engine was built.
    #[must_use]
    pub fn execution_count(&self, computation: &str) -> Option<u64> {
        self.computations
            .iter()
            .position(|c| c.name() == computation)
            .map(|rank| self.executions[rank])
    }

    /// Computation names in topological order.
    #[must_use]
    pub fn computation_names(&self) -> Vec<&str> {
        self.computations.iter().map(Computation::name).collect()
    }

    /// Output cells of every computation, in topological order.
    #[must_use]
    pub fn derived_cells(&self) -> Vec<&str> {
        self.computations
            .iter()
            .flat_map(|c| c.outputs().iter().map(String::as_str))
            .collect()
    }

    /// Names of all source cells, sorted.
    #[must_use]
    pub fn source_cells(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .cells
            .values()
            .filter(|c| c.is_source())
            .map(StateCell::name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Report of the static wave run at build time.
    #[must_use]
    pub fn init_report(&self) -> Option<&WaveReport> {
        self.init_report.as_ref()
    }

    /// Number of waves run so far, including the build-time wave.
    #[must_use]
    pub const fn wave_count(&self) -> u64 {
        self.waves
    }
}
