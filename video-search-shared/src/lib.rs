//! # Video Search Shared
//!
//! Data structures shared across the video search crates: the documents stored in the
//! `videos` and `creators` indexes, the event payloads that mutate them, pagination and
//! query results, and the tag deriver.

pub mod tags;
pub mod types;

pub use tags::{derive_tags, extract_hashtags, normalize_tag, normalize_tags};
pub use types::{
    CreateVideo, CreatorDocument, EnrichedVideo, FacetDistribution, Pagination, TrendingTag,
    UnregisterVideo, UpdateVideo, UpdateVideoMetrics, UpsertCreator, VideoDocument, VideoMetrics,
    VideoPage, VideoStatus, VideoVisibility,
};
