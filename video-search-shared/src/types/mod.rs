//! Document, event and result types shared by the indexer and the query engine.

pub mod creator_document;
pub mod events;
pub mod pagination;
pub mod search_result;
pub mod video_document;

pub use creator_document::CreatorDocument;
pub use events::{CreateVideo, UnregisterVideo, UpdateVideo, UpdateVideoMetrics, UpsertCreator};
pub use pagination::Pagination;
pub use search_result::{EnrichedVideo, FacetDistribution, TrendingTag, VideoPage};
pub use video_document::{VideoDocument, VideoMetrics, VideoStatus, VideoVisibility};
