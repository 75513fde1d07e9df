//! Logical keys into the rollout archive.
//!
//! Keys follow the layout written by the rollout recorder:
//! `{model_id}/model.{snapshot}.tar/history/{episode}/{field}`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::traits::ArchiveError;

/// Training snapshot identifier (checkpoint number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub u32);

impl SnapshotId {
    /// Returns the raw checkpoint number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SnapshotId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Per-episode array stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Raw frame tensor, `[L, H, W, C]` (`ins`).
    Frames,
    /// Post-softmax policy distribution, `[L, A]` (`outs`).
    Policy,
    /// Pre-softmax policy logits, `[L, A]`.
    Logits,
    /// Actor saliency grids, `[L, H, W]`.
    ActorSaliency,
    /// Critic saliency grids, `[L, H, W]`.
    CriticSaliency,
    /// Per-frame scalar reward, `[L]`.
    Reward,
}

impl Field {
    /// Every field, in archive order.
    pub const ALL: [Self; 6] = [
        Self::Logits,
        Self::Policy,
        Self::Frames,
        Self::ActorSaliency,
        Self::CriticSaliency,
        Self::Reward,
    ];

    /// Name of the field inside the archive hierarchy.
    #[must_use]
    pub const fn archive_name(self) -> &'static str {
        match self {
            Self::Frames => "ins",
            Self::Policy => "outs",
            Self::Logits => "logits",
            Self::ActorSaliency => "actor_sal",
            Self::CriticSaliency => "critic_sal",
            Self::Reward => "reward",
        }
    }

    /// Looks up a field by its archive name.
    #[must_use]
    pub fn from_archive_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.archive_name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.archive_name())
    }
}

/// Fully qualified archive key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveKey {
    /// Model (training run) identifier.
    pub model_id: String,
    /// Training snapshot.
    pub snapshot: SnapshotId,
    /// Episode index within the snapshot's rollouts.
    pub episode: u32,
    /// Stored array.
    pub field: Field,
}

impl ArchiveKey {
    /// Creates a key.
    #[must_use]
    pub fn new(model_id: impl Into<String>, snapshot: SnapshotId, episode: u32, field: Field) -> Self {
        Self {
            model_id: model_id.into(),
            snapshot,
            episode,
            field,
        }
    }

    /// Same key with a different field.
    #[must_use]
    pub fn with_field(&self, field: Field) -> Self {
        Self {
            field,
            ..self.clone()
        }
    }

    /// Hierarchical path of this key.
    #[must_use]
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/model.{}.tar/history/{}/{}",
            self.model_id, self.snapshot, self.episode, self.field
        )
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<model>.+)/model\.(?P<snapshot>\d+)\.tar/history/(?P<episode>\d+)/(?P<field>[a-z_]+)$")
            .expect("archive key pattern is valid")
    })
}

impl FromStr for ArchiveKey {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ArchiveError::InvalidKey {
            key: s.to_string(),
            reason: reason.to_string(),
        };

        let caps = key_pattern()
            .captures(s.trim())
            .ok_or_else(|| invalid("does not match {model}/model.{snapshot}.tar/history/{episode}/{field}"))?;

        let snapshot = caps["snapshot"]
            .parse::<u32>()
            .map_err(|_| invalid("snapshot is not a u32"))?;
        let episode = caps["episode"]
            .parse::<u32>()
            .map_err(|_| invalid("episode is not a u32"))?;
        let field = Field::from_archive_name(&caps["field"]).ok_or_else(|| invalid("unknown field"))?;

        Ok(Self {
            model_id: caps["model"].to_string(),
            snapshot: SnapshotId(snapshot),
            episode,
            field,
        })
    }
}
