//! Cached archive reader.
//!
//! `ArchiveReader` is the only way computations touch rollout data. It
//! memoizes reads per snapshot, evicts least-recently-used snapshots once the
//! resident capacity is exceeded (at least one snapshot always stays
//! resident), and turns archive misses into zero-filled placeholders.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::array::Array;
use super::key::{ArchiveKey, Field, SnapshotId};
use super::traits::{ArchiveError, ArchiveStore};
use crate::aggregate::policy::softmax_rows;

/// Shapes of the neutral placeholders substituted for missing data.
///
/// Every placeholder is a single zero-filled frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderShapes {
    /// Frame image shape `[H, W, C]`.
    pub frame: Vec<usize>,
    /// Saliency grid shape `[H, W]`.
    pub grid: [usize; 2],
    /// Number of discrete actions.
    pub actions: usize,
}

impl Default for PlaceholderShapes {
    fn default() -> Self {
        Self {
            frame: vec![210, 160, 3],
            grid: [80, 80],
            actions: 4,
        }
    }
}

impl PlaceholderShapes {
    /// Placeholder array for `field`.
    #[must_use]
    pub fn for_field(&self, field: Field) -> Array {
        let shape = match field {
            Field::Frames => {
                let mut shape = vec![1];
                shape.extend_from_slice(&self.frame);
                shape
            }
            Field::Policy | Field::Logits => vec![1, self.actions],
            Field::ActorSaliency | Field::CriticSaliency => vec![1, self.grid[0], self.grid[1]],
            Field::Reward => vec![1],
        };
        Array::zeros(shape)
    }
}

/// Result of a placeholder-tolerant read.
#[derive(Debug, Clone)]
pub struct Lookup {
    /// The data, or a placeholder.
    pub array: Arc<Array>,
    /// True if `array` is a substituted placeholder.
    pub is_placeholder: bool,
}

/// Every field of one episode, with placeholders already substituted.
#[derive(Debug, Clone)]
pub struct RolloutRecord {
    pub snapshot: SnapshotId,
    pub episode: u32,
    pub frames: Arc<Array>,
    pub policy: Arc<Array>,
    pub reward: Arc<Array>,
    pub actor_saliency: Arc<Array>,
    pub critic_saliency: Arc<Array>,
    /// Fields that were absent from the archive.
    pub missing: Vec<Field>,
}

impl RolloutRecord {
    /// True if every field came from the archive.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Episode length, taken from the reward series; `0` when it is missing.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.missing.contains(&Field::Reward) {
            return 0;
        }
        self.reward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub resident_snapshots: usize,
}

#[derive(Debug, Default)]
struct SnapshotCache {
    // Front is most recently used.
    order: VecDeque<SnapshotId>,
    entries: HashMap<SnapshotId, HashMap<(u32, Field), Arc<Array>>>,
    stats: CacheStats,
}

impl SnapshotCache {
    fn touch(&mut self, snapshot: SnapshotId) {
        if let Some(pos) = self.order.iter().position(|s| *s == snapshot) {
            self.order.remove(pos);
        }
        self.order.push_front(snapshot);
    }

    fn lookup(&mut self, snapshot: SnapshotId, episode: u32, field: Field) -> Option<Arc<Array>> {
        let hit = self
            .entries
            .get(&snapshot)
            .and_then(|m| m.get(&(episode, field)))
            .cloned();
        if hit.is_some() {
            self.stats.hits += 1;
            self.touch(snapshot);
        }
        hit
    }

    fn store(&mut self, snapshot: SnapshotId, episode: u32, field: Field, array: Arc<Array>, capacity: usize) {
        self.entries
            .entry(snapshot)
            .or_default()
            .insert((episode, field), array);
        self.touch(snapshot);

        while self.order.len() > capacity {
            let Some(evicted) = self.order.pop_back() else { break };
            self.entries.remove(&evicted);
            self.stats.evictions += 1;
            debug!(snapshot = %evicted, "evicted snapshot from archive cache");
        }
        self.stats.resident_snapshots = self.order.len();
    }
}

/// Memoizing, placeholder-aware reader over an `ArchiveStore`.
pub struct ArchiveReader {
    store: Arc<dyn ArchiveStore>,
    model_id: String,
    capacity: usize,
    placeholders: PlaceholderShapes,
    cache: Mutex<SnapshotCache>,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("model_id", &self.model_id)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl ArchiveReader {
    /// Creates a reader. `capacity` is the number of resident snapshots; values
    /// below one are raised to one.
    #[must_use]
    pub fn new(
        store: Arc<dyn ArchiveStore>,
        model_id: impl Into<String>,
        capacity: usize,
        placeholders: PlaceholderShapes,
    ) -> Self {
        Self {
            store,
            model_id: model_id.into(),
            capacity: capacity.max(1),
            placeholders,
            cache: Mutex::new(SnapshotCache::default()),
        }
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    #[must_use]
    pub fn placeholders(&self) -> &PlaceholderShapes {
        &self.placeholders
    }

    /// Snapshots present in the underlying store.
    pub fn snapshots(&self) -> Result<Vec<SnapshotId>, ArchiveError> {
        self.store.snapshots(&self.model_id)
    }

    /// Reads one field of one episode.
    ///
    /// A missing policy (`outs`) falls back to a softmax over the stored logits.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the combination is absent, or a backend error.
    pub fn get(&self, snapshot: SnapshotId, episode: u32, field: Field) -> Result<Arc<Array>, ArchiveError> {
        {
            let mut cache = self.cache.lock().map_err(|_| ArchiveError::BackendError("poisoned lock: reader.cache".to_string()))?;
            if let Some(hit) = cache.lookup(snapshot, episode, field) {
                trace!(%snapshot, episode, %field, "archive cache hit");
                return Ok(hit);
            }
            cache.stats.misses += 1;
        }

        let key = ArchiveKey::new(self.model_id.clone(), snapshot, episode, field);
        let array = match self.store.get(&key) {
            Ok(array) => array,
            Err(err) if err.is_not_found() && field == Field::Policy => {
                let logits = self.store.get(&key.with_field(Field::Logits))?;
                debug!(%snapshot, episode, "policy absent, deriving from logits");
                policy_from_logits(&logits)?
            }
            Err(err) => return Err(err),
        };

        let array = Arc::new(array);
        let mut cache = self.cache.lock().map_err(|_| ArchiveError::BackendError("poisoned lock: reader.cache".to_string()))?;
        cache.store(snapshot, episode, field, Arc::clone(&array), self.capacity);
        Ok(array)
    }

    /// Reads one field, substituting the configured placeholder on any failure.
    #[must_use]
    pub fn get_or_placeholder(&self, snapshot: SnapshotId, episode: u32, field: Field) -> Lookup {
        match self.get(snapshot, episode, field) {
            Ok(array) => Lookup {
                array,
                is_placeholder: false,
            },
            Err(err) => {
                if err.is_not_found() {
                    debug!(%snapshot, episode, %field, "archive miss, using placeholder");
                } else {
                    warn!(%snapshot, episode, %field, error = %err, "archive read failed, using placeholder");
                }
                Lookup {
                    array: Arc::new(self.placeholders.for_field(field)),
                    is_placeholder: true,
                }
            }
        }
    }

    /// Assembles a full episode record.
    #[must_use]
    pub fn record(&self, snapshot: SnapshotId, episode: u32) -> RolloutRecord {
        let mut missing = Vec::new();
        let mut fetch = |field: Field| {
            let lookup = self.get_or_placeholder(snapshot, episode, field);
            if lookup.is_placeholder {
                missing.push(field);
            }
            lookup.array
        };

        let frames = fetch(Field::Frames);
        let policy = fetch(Field::Policy);
        let reward = fetch(Field::Reward);
        let actor_saliency = fetch(Field::ActorSaliency);
        let critic_saliency = fetch(Field::CriticSaliency);

        RolloutRecord {
            snapshot,
            episode,
            frames,
            policy,
            reward,
            actor_saliency,
            critic_saliency,
            missing,
        }
    }

    /// Current cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().map(|c| c.stats).unwrap_or_default()
    }

    /// Snapshots currently resident, most recently used first.
    #[must_use]
    pub fn resident_snapshots(&self) -> Vec<SnapshotId> {
        self.cache
            .lock()
            .map(|c| c.order.iter().copied().collect())
            .unwrap_or_default()
    }
}

fn policy_from_logits(logits: &Array) -> Result<Array, ArchiveError> {
    let rows = softmax_rows(&logits.rows_f64());
    #[allow(clippy::cast_possible_truncation)]
    let frames: Vec<Vec<f32>> = rows
        .into_iter()
        .map(|row| row.into_iter().map(|v| v as f32).collect())
        .collect();
    Array::from_frames(logits.frame_shape(), &frames)
}
