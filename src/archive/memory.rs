//! In-memory archive backend.
//!
//! This module provides a thread-safe in-memory implementation of
//! `ArchiveStore`. It is intended for embedded usage, tests, and for
//! rollouts exported to JSON by the recording tools.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::RwLock;

use super::array::Array;
use super::key::{ArchiveKey, SnapshotId};
use super::traits::{ArchiveError, ArchiveStore};

fn lock_err(context: &'static str) -> ArchiveError {
    ArchiveError::BackendError(format!("poisoned lock: {context}"))
}

/// In-memory `ArchiveStore`.
#[derive(Debug, Default)]
pub struct InMemoryArchive {
    arrays: RwLock<HashMap<ArchiveKey, Array>>,
}

impl InMemoryArchive {
    /// Creates an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `array` under `key`, replacing any previous array.
    ///
    /// Intended for loading; consumers only ever read.
    pub fn insert(&self, key: ArchiveKey, array: Array) -> Result<(), ArchiveError> {
        let mut guard = self.arrays.write().map_err(|_| lock_err("archive.insert"))?;
        guard.insert(key, array);
        Ok(())
    }

    /// Number of stored arrays.
    pub fn len(&self) -> Result<usize, ArchiveError> {
        let guard = self.arrays.read().map_err(|_| lock_err("archive.len"))?;
        Ok(guard.len())
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> Result<bool, ArchiveError> {
        Ok(self.len()? == 0)
    }

    /// Loads an archive from a JSON document mapping key paths to arrays:
    ///
    /// ```json
    /// { "model/model.30.tar/history/0/reward": { "shape": [2], "data": [0.0, 1.0] } }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` for malformed JSON or arrays and
    /// `InvalidKey` for paths outside the archive layout.
    pub fn from_json_str(json: &str) -> Result<Self, ArchiveError> {
        let document: BTreeMap<String, Array> =
            serde_json::from_str(json).map_err(|e| ArchiveError::SerializationError(e.to_string()))?;

        let archive = Self::new();
        for (path, array) in document {
            let key: ArchiveKey = path.parse()?;
            archive.insert(key, array)?;
        }
        Ok(archive)
    }

    /// Loads an archive from a JSON file (see [`InMemoryArchive::from_json_str`]).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ArchiveError::BackendError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes the archive to the same JSON document layout.
    pub fn to_json(&self) -> Result<String, ArchiveError> {
        let guard = self.arrays.read().map_err(|_| lock_err("archive.to_json"))?;
        let document: BTreeMap<String, &Array> = guard.iter().map(|(k, v)| (k.path(), v)).collect();
        serde_json::to_string(&document).map_err(|e| ArchiveError::SerializationError(e.to_string()))
    }
}

impl ArchiveStore for InMemoryArchive {
    fn get(&self, key: &ArchiveKey) -> Result<Array, ArchiveError> {
        let guard = self.arrays.read().map_err(|_| lock_err("archive.get"))?;
        guard.get(key).cloned().ok_or_else(|| ArchiveError::not_found(key))
    }

    fn contains(&self, key: &ArchiveKey) -> Result<bool, ArchiveError> {
        let guard = self.arrays.read().map_err(|_| lock_err("archive.contains"))?;
        Ok(guard.contains_key(key))
    }

    fn snapshots(&self, model_id: &str) -> Result<Vec<SnapshotId>, ArchiveError> {
        let guard = self.arrays.read().map_err(|_| lock_err("archive.snapshots"))?;
        let set: BTreeSet<SnapshotId> = guard
            .keys()
            .filter(|k| k.model_id == model_id)
            .map(|k| k.snapshot)
            .collect();
        Ok(set.into_iter().collect())
    }
}
