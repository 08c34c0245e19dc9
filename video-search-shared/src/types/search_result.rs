//! Result shapes returned by the query engine.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::types::creator_document::CreatorDocument;
use crate::types::pagination::Pagination;
use crate::types::video_document::VideoDocument;

/// Facet counts keyed by attribute, then by value.
pub type FacetDistribution = BTreeMap<String, BTreeMap<String, u64>>;

/// A video hit with its creator joined in.
///
/// When the creator is unknown to the index, `creator` serializes as an empty object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedVideo {
    #[serde(flatten)]
    pub video: VideoDocument,
    #[serde(with = "empty_object_when_missing", default)]
    pub creator: Option<CreatorDocument>,
}

/// One page of video hits plus paging totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub hits: Vec<EnrichedVideo>,
    pub page: u64,
    pub per_page: u64,
    pub total_hits: u64,
    pub total_pages: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_distribution: Option<FacetDistribution>,
}

impl VideoPage {
    pub fn new(hits: Vec<EnrichedVideo>, pagination: Pagination, total_hits: u64) -> Self {
        Self {
            hits,
            page: pagination.page,
            per_page: pagination.per_page,
            total_hits,
            total_pages: pagination.total_pages(total_hits),
            facet_distribution: None,
        }
    }

    pub fn with_facets(mut self, facets: FacetDistribution) -> Self {
        self.facet_distribution = Some(facets);
        self
    }
}

/// A tag with the number of public registered videos carrying it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendingTag {
    pub tag: String,
    pub count: u64,
}

mod empty_object_when_missing {
    use super::*;

    pub fn serialize<S>(value: &Option<CreatorDocument>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(creator) => creator.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<CreatorDocument>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None => Ok(None),
            Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
            Some(other) => serde_json::from_value(other)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
