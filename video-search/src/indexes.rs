//! Typed handles over the `videos` and `creators` indexes.
//!
//! Both handles wrap a shared `Arc<dyn DocumentStore>` and convert between JSON documents and
//! the shared document types.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use video_search_repository::{DocumentQuery, DocumentStore, DocumentStoreError, Filter};
use video_search_shared::{CreatorDocument, FacetDistribution, VideoDocument};

/// Logical name of the videos index.
pub const VIDEOS_INDEX: &str = "videos";

/// Logical name of the creators index.
pub const CREATORS_INDEX: &str = "creators";

fn decode<T: DeserializeOwned>(index: &str, value: Value) -> Result<T, DocumentStoreError> {
    serde_json::from_value(value)
        .map_err(|e| DocumentStoreError::parse(format!("invalid document in '{}': {}", index, e)))
}

fn encode<T: Serialize>(document: &T) -> Result<Value, DocumentStoreError> {
    serde_json::to_value(document).map_err(|e| DocumentStoreError::serialization(e.to_string()))
}

/// A window of decoded video hits plus totals.
#[derive(Debug, Clone, Default)]
pub struct VideoHits {
    pub videos: Vec<VideoDocument>,
    pub total: u64,
    pub facet_distribution: FacetDistribution,
}

/// Handle over the `videos` index.
#[derive(Clone)]
pub struct VideosIndex {
    store: Arc<dyn DocumentStore>,
}

impl VideosIndex {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<VideoDocument>, DocumentStoreError> {
        match self.store.get_document(VIDEOS_INDEX, id).await? {
            Some(value) => decode(VIDEOS_INDEX, value).map(Some),
            None => Ok(None),
        }
    }

    /// Write the full document, replacing any previous version.
    pub async fn put(&self, video: &VideoDocument) -> Result<(), DocumentStoreError> {
        let document = encode(video)?;
        self.store.put_document(VIDEOS_INDEX, &video.id, &document).await
    }

    /// Merge a partial document into an existing video.
    pub async fn update(&self, id: &str, partial: &Value) -> Result<(), DocumentStoreError> {
        self.store.update_document(VIDEOS_INDEX, id, partial).await
    }

    pub async fn search(&self, query: &DocumentQuery) -> Result<VideoHits, DocumentStoreError> {
        let result = self.store.query(VIDEOS_INDEX, query).await?;
        let videos = result
            .hits
            .into_iter()
            .map(|hit| decode(VIDEOS_INDEX, hit))
            .collect::<Result<Vec<VideoDocument>, _>>()?;

        Ok(VideoHits {
            videos,
            total: result.total,
            facet_distribution: result.facet_distribution,
        })
    }
}

/// Handle over the `creators` index.
#[derive(Clone)]
pub struct CreatorsIndex {
    store: Arc<dyn DocumentStore>,
}

impl CreatorsIndex {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<CreatorDocument>, DocumentStoreError> {
        match self.store.get_document(CREATORS_INDEX, id).await? {
            Some(value) => decode(CREATORS_INDEX, value).map(Some),
            None => Ok(None),
        }
    }

    /// Insert a creator, failing with `DocumentExists` if one with the same id is present.
    pub async fn create(&self, creator: &CreatorDocument) -> Result<(), DocumentStoreError> {
        let document = encode(creator)?;
        self.store
            .create_document(CREATORS_INDEX, &creator.id, &document)
            .await
    }

    pub async fn update(&self, id: &str, partial: &Value) -> Result<(), DocumentStoreError> {
        self.store.update_document(CREATORS_INDEX, id, partial).await
    }

    /// Fetch every creator whose id is in `ids` with a single query.
    pub async fn find_by_ids(
        &self,
        ids: &BTreeSet<String>,
    ) -> Result<Vec<CreatorDocument>, DocumentStoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = DocumentQuery::new()
            .filter(Filter::any_of("id", ids.iter().cloned()))
            .paginate(0, ids.len() as u64);

        let result = self.store.query(CREATORS_INDEX, &query).await?;
        result
            .hits
            .into_iter()
            .map(|hit| decode(CREATORS_INDEX, hit))
            .collect()
    }
}
