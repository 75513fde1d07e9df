//! Error types for rollscope.
//!
//! All errors are strongly typed using thiserror, one enum per concern.
//! Only `GraphError` and `ConfigError` are fatal; archive misses and
//! out-of-domain events are recovered where they occur.

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;

/// Errors raised while registering or running the reactive graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Cycle detected among computations: {}", .computations.join(", "))]
    CycleDetected {
        computations: Vec<String>,
    },

    #[error("Unknown cell '{name}'")]
    UnknownCell {
        name: String,
    },

    #[error("Cell '{cell}' is written by both '{first}' and '{second}'")]
    DuplicateWriter {
        cell: String,
        first: String,
        second: String,
    },

    #[error("Cell '{cell}' is declared as a source cell but computation '{computation}' writes it")]
    SourceCellIsDerived {
        cell: String,
        computation: String,
    },

    #[error("Computation '{name}' is registered twice")]
    DuplicateComputation {
        name: String,
    },

    #[error("Cell '{name}' is derived and cannot be written directly")]
    NotASourceCell {
        name: String,
    },

    #[error("Computation '{computation}' produced {actual} outputs, expected {expected}")]
    OutputArity {
        computation: String,
        expected: usize,
        actual: usize,
    },

    #[error("Computation '{computation}' failed: {reason}")]
    ComputationFailed {
        computation: String,
        reason: String,
    },
}

impl GraphError {
    /// Shorthand used by computation closures to report a failure.
    #[must_use]
    pub fn failed(computation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ComputationFailed {
            computation: computation.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the interaction router.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouterError {
    #[error("Value {value} is outside the domain of '{target}'")]
    OutOfDomain {
        target: String,
        value: f64,
    },

    #[error("No binding registered for target '{target}'")]
    UnknownTarget {
        target: String,
    },
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config field '{field}': {reason}")]
    Invalid {
        field: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while parsing a training log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Training log is empty")]
    Empty,

    #[error("Line {line}: expected {expected} columns, found {actual}")]
    ColumnCount {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Line {line}: column '{column}' is not a number: '{raw}'")]
    NotANumber {
        line: usize,
        column: String,
        raw: String,
    },

    #[error("Failed to read training log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error type for rollscope.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Training log error: {0}")]
    Log(#[from] LogError),

    #[error("Event queue full (capacity: {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Event queue disconnected")]
    QueueClosed,

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl ScopeError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is an archive miss that callers should recover from.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Archive(ArchiveError::NotFound { .. }))
    }

    /// Returns true if the event queue refused a tick because it was full.
    #[must_use]
    pub const fn is_backpressure(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    /// Returns true if the graph registration contains a cycle.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::Graph(GraphError::CycleDetected { .. }))
    }

    /// Returns true if this error must stop the system at startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Graph(_) | Self::Config(_) | Self::Internal { .. })
    }
}

/// Result type alias for rollscope operations.
pub type ScopeResult<T> = Result<T, ScopeError>;
