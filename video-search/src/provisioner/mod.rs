//! Index provisioning.
//!
//! Declares the settings of the `videos` and `creators` indexes and creates them once per
//! process before any consumer or HTTP traffic is served.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use video_search_repository::{
    DocumentStore, DocumentStoreError, FieldKind, FieldMapping, IndexSettings, RankingRule,
};

use crate::indexes::{CREATORS_INDEX, VIDEOS_INDEX};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Relevance rules followed by the query's own sort clauses.
fn base_ranking_rules() -> Vec<RankingRule> {
    vec![
        RankingRule::Words,
        RankingRule::Exactness,
        RankingRule::Typo,
        RankingRule::Proximity,
        RankingRule::Attribute,
        RankingRule::Sort,
    ]
}

/// Video ranking breaks ties by popularity, then recency.
fn videos_ranking_rules() -> Vec<RankingRule> {
    let mut rules = base_ranking_rules();
    rules.push(RankingRule::Desc("metrics.viewsCount".to_string()));
    rules.push(RankingRule::Desc("createdAt".to_string()));
    rules
}

/// Settings of the `videos` index.
pub fn videos_index_settings() -> IndexSettings {
    IndexSettings {
        name: VIDEOS_INDEX.to_string(),
        primary_key: "id".to_string(),
        fields: vec![
            FieldMapping::new("id", FieldKind::Keyword),
            FieldMapping::new("creatorId", FieldKind::Keyword),
            FieldMapping::new("title", FieldKind::Text),
            FieldMapping::new("description", FieldKind::Text),
            FieldMapping::new("tags", FieldKind::Keyword),
            FieldMapping::new("thumbnailUrl", FieldKind::Unindexed),
            FieldMapping::new("previewThumbnailUrl", FieldKind::Unindexed),
            FieldMapping::new("lengthSeconds", FieldKind::Long),
            FieldMapping::new("visibility", FieldKind::Keyword),
            FieldMapping::new("status", FieldKind::Keyword),
            FieldMapping::new("metrics.viewsCount", FieldKind::Long),
            FieldMapping::new("metrics.viewsCountUpdatedAt", FieldKind::Date),
            FieldMapping::new("createdAt", FieldKind::Date),
        ],
        searchable: strings(&["title", "description", "tags", "creatorId", "id"]),
        filterable: strings(&["id", "tags", "creatorId", "status", "visibility", "createdAt"]),
        sortable: strings(&["createdAt", "metrics.viewsCount"]),
        ranking_rules: videos_ranking_rules(),
    }
}

/// Settings of the `creators` index.
pub fn creators_index_settings() -> IndexSettings {
    IndexSettings {
        name: CREATORS_INDEX.to_string(),
        primary_key: "id".to_string(),
        fields: vec![
            FieldMapping::new("id", FieldKind::Keyword),
            FieldMapping::new("displayName", FieldKind::Text),
            FieldMapping::new("nickname", FieldKind::Keyword),
            FieldMapping::new("thumbnailUrl", FieldKind::Unindexed),
        ],
        searchable: Vec::new(),
        filterable: strings(&["id"]),
        sortable: Vec::new(),
        // Creator documents carry no metrics or timestamps to break ties on.
        ranking_rules: base_ranking_rules(),
    }
}

/// Creates both indexes at most once per process.
pub struct IndexProvisioner {
    store: Arc<dyn DocumentStore>,
    provisioned: OnceCell<()>,
}

impl IndexProvisioner {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            provisioned: OnceCell::new(),
        }
    }

    /// Ensure both indexes exist with their settings.
    ///
    /// Concurrent callers wait for the same attempt. A failed attempt is not cached and the
    /// next call retries.
    #[instrument(skip(self))]
    pub async fn provision(&self) -> Result<(), DocumentStoreError> {
        self.provisioned
            .get_or_try_init(|| async {
                let videos = videos_index_settings();
                let creators = creators_index_settings();
                tokio::try_join!(
                    self.store.ensure_index(&videos),
                    self.store.ensure_index(&creators)
                )?;
                info!(indexes = ?[VIDEOS_INDEX, CREATORS_INDEX], "Indexes provisioned");
                Ok::<(), DocumentStoreError>(())
            })
            .await?;
        Ok(())
    }

    pub fn is_provisioned(&self) -> bool {
        self.provisioned.initialized()
    }
}
