//! Query engine serving the read operations.

use tracing::{debug, instrument};
use uuid::Uuid;

use video_search_repository::{DocumentQuery, Filter, SortClause};
use video_search_shared::{derive_tags, normalize_tags, Pagination, TrendingTag, VideoPage};

use crate::errors::QueryError;
use crate::federation::enrichment::enrich_videos;
use crate::federation::QueryConfig;
use crate::indexes::{CreatorsIndex, VideoHits, VideosIndex};

/// Upper bound of `trending_tags`.
pub const MAX_TRENDING_TAGS: u64 = 100;

const TAGS_FACET: &str = "tags";
const CREATED_AT: &str = "createdAt";

/// Read side over the search indexes.
#[derive(Clone)]
pub struct QueryEngine {
    videos: VideosIndex,
    creators: CreatorsIndex,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(videos: VideosIndex, creators: CreatorsIndex, config: QueryConfig) -> Self {
        Self {
            videos,
            creators,
            config,
        }
    }

    /// Base query restricted to eligible videos and windowed by `pagination`.
    ///
    /// A page past the result window fetches no hits but still counts totals and facets.
    fn eligible(&self, pagination: &Pagination) -> DocumentQuery {
        let query = DocumentQuery::new().filters(self.config.status_filter.filters());
        if pagination.within_result_window() {
            query.paginate(pagination.offset(), pagination.limit())
        } else {
            debug!(page = pagination.page, "Page past the result window, returning no hits");
            query.paginate(0, 0)
        }
    }

    async fn page(
        &self,
        hits: VideoHits,
        pagination: Pagination,
        with_facets: bool,
    ) -> Result<VideoPage, QueryError> {
        let enriched = enrich_videos(&self.creators, hits.videos).await?;
        let page = VideoPage::new(enriched, pagination, hits.total);
        if with_facets {
            Ok(page.with_facets(hits.facet_distribution))
        } else {
            Ok(page)
        }
    }

    /// Newest eligible videos first.
    #[instrument(skip(self))]
    pub async fn search_latest(&self, pagination: Pagination) -> Result<VideoPage, QueryError> {
        pagination.validate().map_err(QueryError::invalid_input)?;

        let query = self
            .eligible(&pagination)
            .sort_by(SortClause::desc(CREATED_AT))
            .facet(TAGS_FACET);
        let hits = self.videos.search(&query).await?;
        debug!(total = hits.total, "Latest videos fetched");
        self.page(hits, pagination, true).await
    }

    /// Full-text search in relevance order.
    #[instrument(skip(self))]
    pub async fn search_by_query(
        &self,
        text: &str,
        pagination: Pagination,
    ) -> Result<VideoPage, QueryError> {
        pagination.validate().map_err(QueryError::invalid_input)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(QueryError::invalid_input("q must not be empty"));
        }

        let query = self.eligible(&pagination).with_text(text).facet(TAGS_FACET);
        let hits = self.videos.search(&query).await?;
        debug!(total = hits.total, "Text search completed");
        self.page(hits, pagination, true).await
    }

    /// Eligible videos carrying any of `tags`.
    #[instrument(skip(self))]
    pub async fn search_by_tags(
        &self,
        tags: &[String],
        pagination: Pagination,
    ) -> Result<VideoPage, QueryError> {
        pagination.validate().map_err(QueryError::invalid_input)?;
        let tags = normalize_tags(tags);
        if tags.is_empty() {
            return Err(QueryError::invalid_input("at least one tag is required"));
        }

        let query = self
            .eligible(&pagination)
            .filter(Filter::any_of(TAGS_FACET, tags));
        let hits = self.videos.search(&query).await?;
        debug!(total = hits.total, "Tag search completed");
        self.page(hits, pagination, false).await
    }

    /// Eligible videos sharing a tag with the target, or from the same creator when the target
    /// has no tags.
    #[instrument(skip(self))]
    pub async fn search_related(
        &self,
        video_id: &str,
        pagination: Pagination,
    ) -> Result<VideoPage, QueryError> {
        pagination.validate().map_err(QueryError::invalid_input)?;
        Uuid::parse_str(video_id)
            .map_err(|_| QueryError::invalid_input("videoId must be a valid UUID"))?;

        let target = self
            .videos
            .get(video_id)
            .await?
            .ok_or_else(|| QueryError::VideoNotFound(video_id.to_string()))?;

        let tags = derive_tags(&target.title, &target.description, Some(target.tags.as_slice()));
        let relation = if tags.is_empty() {
            debug!(creator_id = %target.creator_id, "Target has no tags, relating by creator");
            Filter::equals("creatorId", target.creator_id.as_str())
        } else {
            Filter::any_of(TAGS_FACET, tags)
        };

        let query = self
            .eligible(&pagination)
            .filter(relation)
            .filter(Filter::not_equals("id", video_id))
            .sort_by(SortClause::desc(CREATED_AT))
            .facet(TAGS_FACET);
        let hits = self.videos.search(&query).await?;
        debug!(total = hits.total, "Related videos fetched");
        self.page(hits, pagination, true).await
    }

    /// The most frequent tags across eligible videos, ties broken alphabetically.
    #[instrument(skip(self))]
    pub async fn trending_tags(&self, max_tags_count: u64) -> Result<Vec<TrendingTag>, QueryError> {
        if !(1..=MAX_TRENDING_TAGS).contains(&max_tags_count) {
            return Err(QueryError::invalid_input(format!(
                "maxTagsCount must be between 1 and {}",
                MAX_TRENDING_TAGS
            )));
        }

        let query = DocumentQuery::new()
            .filters(self.config.status_filter.filters())
            .paginate(0, 0)
            .facet(TAGS_FACET);
        let mut hits = self.videos.search(&query).await?;

        let mut tags: Vec<TrendingTag> = hits
            .facet_distribution
            .remove(TAGS_FACET)
            .unwrap_or_default()
            .into_iter()
            .map(|(tag, count)| TrendingTag { tag, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        tags.truncate(max_tags_count as usize);
        Ok(tags)
    }
}
