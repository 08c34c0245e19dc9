//! Query federation over the `videos` and `creators` indexes.
//!
//! Every read only exposes eligible videos, builds one `videos` query, and joins creators into
//! the resulting page.

mod engine;
mod enrichment;

pub use engine::{QueryEngine, MAX_TRENDING_TAGS};
pub use enrichment::enrich_videos;

use tracing::warn;

use video_search_repository::Filter;
use video_search_shared::{VideoStatus, VideoVisibility};

use crate::config::env_or;

/// Which videos count as eligible for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// `status = Registered AND visibility = Public`.
    #[default]
    Strict,
    /// `status != Unregistered AND visibility = Public`.
    Loose,
}

impl StatusFilter {
    /// Filters restricting a query to eligible videos.
    pub fn filters(&self) -> Vec<Filter> {
        let status = match self {
            StatusFilter::Strict => Filter::equals("status", VideoStatus::Registered.as_str()),
            StatusFilter::Loose => {
                Filter::not_equals("status", VideoStatus::Unregistered.as_str())
            }
        };
        vec![
            status,
            Filter::equals("visibility", VideoVisibility::Public.as_str()),
        ]
    }
}

/// Configuration of the query engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryConfig {
    pub status_filter: StatusFilter,
}

impl QueryConfig {
    /// Read the configuration from `SEARCH_STATUS_FILTER` (`strict` or `loose`).
    pub fn from_env() -> Self {
        let status_filter = match env_or("SEARCH_STATUS_FILTER", "strict")
            .to_lowercase()
            .as_str()
        {
            "strict" => StatusFilter::Strict,
            "loose" => StatusFilter::Loose,
            other => {
                warn!(value = %other, "Invalid SEARCH_STATUS_FILTER, defaulting to 'strict'");
                StatusFilter::Strict
            }
        };
        Self { status_filter }
    }
}
