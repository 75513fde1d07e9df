//! Abstract archive traits for rollscope.
//!
//! These traits define the contract that archive backends must implement.
//! By using traits, we enable:
//! - In-memory backends for testing and embedded use
//! - File-format backends (HDF5 exports, npz bundles) living outside this crate

use thiserror::Error;

use super::array::Array;
use super::key::{ArchiveKey, SnapshotId};

/// Errors that can occur during archive reads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArchiveError {
    /// Snapshot, episode or field is absent.
    #[error("Archive key not found: {key}")]
    NotFound {
        key: String,
    },

    /// Element count does not match the declared shape.
    #[error("Shape {shape:?} does not hold {len} elements")]
    ShapeMismatch {
        shape: Vec<usize>,
        len: usize,
    },

    /// Key path could not be parsed.
    #[error("Invalid archive key '{key}': {reason}")]
    InvalidKey {
        key: String,
        reason: String,
    },

    /// Backend error.
    #[error("Archive backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ArchiveError {
    /// Creates a `NotFound` for the given key.
    #[must_use]
    pub fn not_found(key: &ArchiveKey) -> Self {
        Self::NotFound { key: key.path() }
    }

    /// Returns true if the requested data simply does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Read-only keyed lookup into a hierarchical array store.
///
/// Reads must be idempotent: the same key always yields structurally
/// identical data.
pub trait ArchiveStore: Send + Sync {
    /// Fetch the array stored under `key`.
    ///
    /// # Errors
    /// - `NotFound`: if the snapshot/episode/field combination is absent
    /// - `BackendError`: if the backend could not be read
    fn get(&self, key: &ArchiveKey) -> Result<Array, ArchiveError>;

    /// Returns true if `key` is present.
    fn contains(&self, key: &ArchiveKey) -> Result<bool, ArchiveError>;

    /// Snapshots recorded for a model, ascending.
    fn snapshots(&self, model_id: &str) -> Result<Vec<SnapshotId>, ArchiveError>;
}
