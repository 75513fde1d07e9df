//! Reactive dependency graph.
//!
//! Source cells are written from outside; derived cells are written only by
//! the computation that declares them. A write starts a wave that runs every
//! affected computation exactly once, in topological order.

pub mod cell;
pub mod computation;
pub mod engine;

pub use cell::{CellKind, CellValue, StateCell};
pub use computation::{Computation, ComputationBuilder, ComputeFn, ComputeResult};
pub use engine::{GraphBuilder, GraphEngine, WaveId, WaveReport};
