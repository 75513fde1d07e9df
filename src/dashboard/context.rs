//! Per-session state shared by every computation.

use std::sync::Arc;

use tracing::{info, warn};

use crate::archive::{ArchiveReader, ArchiveStore};
use crate::config::DashboardConfig;
use crate::training_log::TrainingLog;

/// Everything a computation may read besides its input cells.
///
/// Built once per dashboard and shared by `Arc`.
#[derive(Debug)]
pub struct SessionContext {
    pub config: DashboardConfig,
    pub reader: ArchiveReader,
    /// `None` when no log is configured or it could not be read.
    pub training_log: Option<TrainingLog>,
}

impl SessionContext {
    /// Creates the reader over `store` and loads the training log, if any.
    ///
    /// An unreadable or malformed log is logged and treated as absent.
    #[must_use]
    pub fn new(config: DashboardConfig, store: Arc<dyn ArchiveStore>) -> Self {
        let reader = ArchiveReader::new(
            store,
            config.model_id.clone(),
            config.cache_capacity,
            config.placeholders.clone(),
        );

        let training_log = config.training_log.as_ref().and_then(|path| match TrainingLog::from_file(path) {
            Ok(log) => {
                info!(path = %path.display(), rows = log.len(), "training log loaded");
                Some(log)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "training log unavailable");
                None
            }
        });

        Self {
            config,
            reader,
            training_log,
        }
    }
}
