//! Derived-data aggregation.
//!
//! Pure, stateless functions that turn raw per-frame arrays into series for
//! charts. Every function tolerates any episode length (including zero, which
//! yields an empty result) and any grid size, and never emits NaN or infinity
//! for well-formed input.

pub mod entropy;
pub mod policy;
pub mod regions;
pub mod rolling;
pub mod selection;
pub mod summary;
pub mod trajectory;

pub use entropy::{entropy, entropy_series};
pub use policy::{action_column, argmax_actions, softmax_rows, Action};
pub use regions::{quadrant_fractions, regional_intensity, Quadrant, RegionSeries};
pub use rolling::{cumulative_sum, rolling_stats, RollingStats};
pub use selection::{select_frames, threshold_indices, FrameSelection};
pub use summary::{mean_frame_total, summarize, summarize_snapshots, SnapshotSummary};
pub use trajectory::{reconstruct_trajectory, TrajectoryParams};
