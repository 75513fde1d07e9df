//! Dashboard configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::TrajectoryParams;
use crate::archive::PlaceholderShapes;
use crate::error::ConfigError;
use crate::router::ControlDomain;

/// Frame control range and step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameControl {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl Default for FrameControl {
    fn default() -> Self {
        Self {
            min: 0,
            max: 3000,
            step: 5,
        }
    }
}

impl FrameControl {
    #[must_use]
    pub fn domain(&self) -> ControlDomain {
        ControlDomain::stepped(self.min, self.max, self.step)
    }
}

/// Static configuration of one dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Model id prefix of every archive key.
    pub model_id: String,
    /// Episode shown for every snapshot.
    pub episode: u32,
    /// Snapshots offered by the snapshot control and comparison dropdowns.
    pub snapshots: Vec<u32>,
    /// Initially selected snapshot; must be one of `snapshots`.
    pub default_snapshot: u32,
    pub frame_control: FrameControl,
    /// Amount moved by the step-back/step-forward buttons.
    pub frame_step_delta: i64,
    /// Window of the rolling reward statistics. `0` behaves as `1`.
    pub rolling_window: usize,
    /// Frames above this fraction of the peak saliency are used for the overlay.
    pub selection_fraction: f64,
    pub trajectory: TrajectoryParams,
    /// Snapshots kept resident by the archive reader.
    pub cache_capacity: usize,
    /// Max queued UI ticks before senders are refused.
    pub event_queue_capacity: usize,
    /// Display labels of the discrete actions, by index.
    pub action_labels: Vec<String>,
    pub placeholders: PlaceholderShapes,
    /// Training log (comma-separated, header line). `None` leaves the curves empty.
    pub training_log: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            model_id: "models_model7-02-17-20-41".to_string(),
            episode: 0,
            snapshots: (1..=10).map(|i| i * 10).collect(),
            default_snapshot: 50,
            frame_control: FrameControl::default(),
            frame_step_delta: 5,
            rolling_window: 20,
            selection_fraction: 0.5,
            trajectory: TrajectoryParams::default(),
            cache_capacity: 4,
            event_queue_capacity: 256,
            action_labels: ["NOOP", "FIRE", "RIGHT", "LEFT"].iter().map(ToString::to_string).collect(),
            placeholders: PlaceholderShapes::default(),
            training_log: None,
        }
    }
}

impl DashboardConfig {
    /// Parses and validates a JSON document. Absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::invalid("model_id", "must not be empty"));
        }
        if self.snapshots.is_empty() {
            return Err(ConfigError::invalid("snapshots", "at least one snapshot is required"));
        }
        if !self.snapshots.contains(&self.default_snapshot) {
            return Err(ConfigError::invalid(
                "default_snapshot",
                format!("{} is not in the snapshot set", self.default_snapshot),
            ));
        }
        let fc = &self.frame_control;
        if fc.min > fc.max {
            return Err(ConfigError::invalid("frame_control", "min exceeds max"));
        }
        if fc.step <= 0 {
            return Err(ConfigError::invalid("frame_control.step", "must be positive"));
        }
        if self.frame_step_delta <= 0 {
            return Err(ConfigError::invalid("frame_step_delta", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.selection_fraction) {
            return Err(ConfigError::invalid("selection_fraction", "must lie in [0, 1]"));
        }
        if !(self.trajectory.step.is_finite() && self.trajectory.bound.is_finite() && self.trajectory.bound >= 0.0) {
            return Err(ConfigError::invalid("trajectory", "step and bound must be finite, bound non-negative"));
        }
        if self.action_labels.len() != self.placeholders.actions {
            return Err(ConfigError::invalid(
                "action_labels",
                format!(
                    "{} labels for {} actions",
                    self.action_labels.len(),
                    self.placeholders.actions
                ),
            ));
        }
        if self.placeholders.frame.is_empty() || self.placeholders.grid.contains(&0) {
            return Err(ConfigError::invalid("placeholders", "shapes must be non-empty"));
        }
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::invalid("event_queue_capacity", "must be positive"));
        }
        Ok(())
    }

    /// Effective rolling window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.rolling_window.max(1)
    }

    /// Domain of the snapshot controls.
    #[must_use]
    pub fn snapshot_domain(&self) -> ControlDomain {
        ControlDomain::enumerated(self.snapshots.iter().map(|&s| i64::from(s)))
    }

    /// Label of action `index`, or its number when unlabeled.
    #[must_use]
    pub fn action_label(&self, index: usize) -> String {
        self.action_labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("action {index}"))
    }
}
