//! Synchronizers applying domain events to the search indexes.
//!
//! Every operation is one unit of work: a read of the current document followed by at most
//! one write. Staleness and lifecycle guards make redelivery and reordering safe.

mod creator;
mod outcome;
mod video;

pub use creator::CreatorSynchronizer;
pub use outcome::{SyncOutcome, SyncStats, SyncStatsSnapshot};
pub use video::VideoSynchronizer;

use crate::config::env_flag;

/// Behavior switches for the video synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Reject metrics updates that are not newer than the stored state.
    pub metrics_staleness_guard: bool,
    /// Recompute tags from title, description and tags on every update.
    pub recompute_tags_on_update: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            metrics_staleness_guard: true,
            recompute_tags_on_update: true,
        }
    }
}

impl SyncConfig {
    /// Read the configuration from `METRICS_STALENESS_GUARD` and `RECOMPUTE_TAGS_ON_UPDATE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            metrics_staleness_guard: env_flag(
                "METRICS_STALENESS_GUARD",
                defaults.metrics_staleness_guard,
            ),
            recompute_tags_on_update: env_flag(
                "RECOMPUTE_TAGS_ON_UPDATE",
                defaults.recompute_tags_on_update,
            ),
        }
    }
}
