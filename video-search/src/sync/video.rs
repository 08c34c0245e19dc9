//! Video synchronizer.
//!
//! Applies create, update, unregister and metrics events to the `videos` index.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use video_search_repository::DocumentStoreError;
use video_search_shared::{
    derive_tags, normalize_tags, CreateVideo, UnregisterVideo, UpdateVideo, UpdateVideoMetrics,
    VideoDocument, VideoMetrics, VideoStatus,
};

use crate::indexes::VideosIndex;
use crate::sync::{SyncConfig, SyncOutcome};

/// Keeps the `videos` index in sync with video events.
#[derive(Clone)]
pub struct VideoSynchronizer {
    videos: VideosIndex,
    config: SyncConfig,
}

fn tags_value<I: IntoIterator<Item = String>>(tags: I) -> Value {
    Value::Array(tags.into_iter().map(Value::String).collect())
}

impl VideoSynchronizer {
    pub fn new(videos: VideosIndex, config: SyncConfig) -> Self {
        Self { videos, config }
    }

    /// Index a new video with zeroed metrics.
    ///
    /// There is no existence check: a redelivered create overwrites the document with the same
    /// content.
    #[instrument(skip(self, payload), fields(video_id = %payload.id))]
    pub async fn create_video(&self, payload: CreateVideo) -> Result<SyncOutcome, DocumentStoreError> {
        let tags = derive_tags(&payload.title, &payload.description, payload.tags.as_deref());

        let document = VideoDocument {
            id: payload.id,
            creator_id: payload.creator_id,
            title: payload.title,
            description: payload.description,
            tags: tags.into_iter().collect(),
            thumbnail_url: payload.thumbnail_url,
            preview_thumbnail_url: payload.preview_thumbnail_url,
            length_seconds: payload.length_seconds,
            visibility: payload.visibility,
            status: payload.status,
            metrics: VideoMetrics::default(),
            created_at: payload.created_at,
        };

        self.videos.put(&document).await?;
        info!(tag_count = document.tags.len(), "Video indexed");
        Ok(SyncOutcome::Applied)
    }

    /// Apply the supplied fields of an update to an existing, registered video.
    #[instrument(skip(self, payload), fields(video_id = %payload.id))]
    pub async fn update_video(&self, payload: UpdateVideo) -> Result<SyncOutcome, DocumentStoreError> {
        let existing = match self.videos.get(&payload.id).await? {
            Some(existing) => existing,
            None => {
                warn!("Discarding update for unknown video");
                return Ok(SyncOutcome::DiscardedMissing);
            }
        };
        if existing.is_unregistered() {
            warn!("Discarding update for unregistered video");
            return Ok(SyncOutcome::DiscardedTerminal);
        }

        let mut partial = payload.supplied_fields();

        if self.config.recompute_tags_on_update {
            let title = payload.title.as_deref().unwrap_or(&existing.title);
            let description = payload.description.as_deref().unwrap_or(&existing.description);
            let explicit = payload.tags.as_deref().unwrap_or(existing.tags.as_slice());
            let tags = derive_tags(title, description, Some(explicit));
            partial.insert("tags".to_string(), tags_value(tags));
        } else if let Some(tags) = payload.tags.as_deref() {
            partial.insert("tags".to_string(), tags_value(normalize_tags(tags)));
        }

        if partial.is_empty() {
            debug!("Update carries no fields");
            return Ok(SyncOutcome::Applied);
        }

        let field_count = partial.len();
        self.videos
            .update(&payload.id, &Value::Object(partial))
            .await?;
        info!(field_count = field_count, "Video updated");
        Ok(SyncOutcome::Applied)
    }

    /// Move a registered video to the terminal `Unregistered` status.
    #[instrument(skip(self, payload), fields(video_id = %payload.video_id))]
    pub async fn unregister_video(
        &self,
        payload: UnregisterVideo,
    ) -> Result<SyncOutcome, DocumentStoreError> {
        let existing = match self.videos.get(&payload.video_id).await? {
            Some(existing) => existing,
            None => {
                warn!("Discarding unregister for unknown video");
                return Ok(SyncOutcome::DiscardedMissing);
            }
        };
        if existing.is_unregistered() {
            warn!("Video already unregistered");
            return Ok(SyncOutcome::DiscardedTerminal);
        }

        self.videos
            .update(
                &payload.video_id,
                &json!({ "status": VideoStatus::Unregistered.as_str() }),
            )
            .await?;
        info!("Video unregistered");
        Ok(SyncOutcome::Applied)
    }

    /// Store a new views count if the event is newer than the stored one.
    #[instrument(skip(self, payload), fields(video_id = %payload.video_id, views_count = payload.views_count))]
    pub async fn update_video_metrics(
        &self,
        payload: UpdateVideoMetrics,
    ) -> Result<SyncOutcome, DocumentStoreError> {
        let existing = match self.videos.get(&payload.video_id).await? {
            Some(existing) => existing,
            None => {
                warn!("Discarding metrics for unknown video");
                return Ok(SyncOutcome::DiscardedMissing);
            }
        };
        if existing.is_unregistered() {
            warn!("Discarding metrics for unregistered video");
            return Ok(SyncOutcome::DiscardedTerminal);
        }

        let updated_at = if self.config.metrics_staleness_guard {
            match payload.updated_at {
                Some(updated_at) if existing.metrics.accepts_update_at(updated_at) => updated_at,
                Some(updated_at) => {
                    warn!(
                        updated_at = %updated_at,
                        stored_updated_at = ?existing.metrics.views_count_updated_at,
                        "Discarding stale metrics update"
                    );
                    return Ok(SyncOutcome::DiscardedStale);
                }
                None => {
                    warn!("Discarding metrics update without timestamp");
                    return Ok(SyncOutcome::DiscardedStale);
                }
            }
        } else {
            payload.updated_at.unwrap_or_else(Utc::now)
        };

        let metrics = VideoMetrics {
            views_count: payload.views_count,
            views_count_updated_at: Some(updated_at),
        };
        let metrics = serde_json::to_value(&metrics)
            .map_err(|e| DocumentStoreError::serialization(e.to_string()))?;

        self.videos
            .update(&payload.video_id, &json!({ "metrics": metrics }))
            .await?;
        info!(updated_at = %updated_at, "Video metrics updated");
        Ok(SyncOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use std::sync::Arc;
    use video_search_repository::{DocumentStore, InMemoryDocumentStore};
    use video_search_shared::VideoVisibility;

    use crate::provisioner::videos_index_settings;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, secs).unwrap()
    }

    fn create_payload(id: &str) -> CreateVideo {
        CreateVideo {
            id: id.to_string(),
            creator_id: "c1".to_string(),
            title: "Morning run #fitness".to_string(),
            description: "Along the river #outdoors".to_string(),
            tags: Some(vec!["#Running".to_string(), "  ".to_string()]),
            thumbnail_url: "https://cdn.example.com/t.png".to_string(),
            preview_thumbnail_url: "https://cdn.example.com/p.gif".to_string(),
            length_seconds: 600,
            visibility: VideoVisibility::Public,
            status: VideoStatus::Registered,
            created_at: at(0),
        }
    }

    async fn synchronizer(config: SyncConfig) -> (VideoSynchronizer, VideosIndex) {
        let store = InMemoryDocumentStore::new();
        store.ensure_index(&videos_index_settings()).await.unwrap();
        let videos = VideosIndex::new(Arc::new(store));
        (VideoSynchronizer::new(videos.clone(), config), videos)
    }

    fn metrics(video_id: &str, views_count: u64, updated_at: Option<DateTime<Utc>>) -> UpdateVideoMetrics {
        UpdateVideoMetrics {
            video_id: video_id.to_string(),
            views_count,
            updated_at,
        }
    }

    #[tokio::test]
    async fn test_create_video_derives_tags_and_zeroes_metrics() {
        let (sync, videos) = synchronizer(SyncConfig::default()).await;

        let outcome = sync.create_video(create_payload("v1")).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Applied);

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert_eq!(doc.tags, vec!["Running", "fitness", "outdoors"]);
        assert_eq!(doc.metrics.views_count, 0);
        assert!(doc.metrics.views_count_updated_at.is_none());
    }

    #[tokio::test]
    async fn test_create_video_is_idempotent() {
        let (sync, videos) = synchronizer(SyncConfig::default()).await;

        sync.create_video(create_payload("v1")).await.unwrap();
        let first = videos.get("v1").await.unwrap();
        sync.create_video(create_payload("v1")).await.unwrap();
        let second = videos.get("v1").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_video_recomputes_tags_with_stored_tags() {
        let (sync, videos) = synchronizer(SyncConfig::default()).await;
        sync.create_video(create_payload("v1")).await.unwrap();

        let update = UpdateVideo {
            id: "v1".to_string(),
            title: Some("Evening run #night".to_string()),
            ..Default::default()
        };
        assert_eq!(sync.update_video(update).await.unwrap(), SyncOutcome::Applied);

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert_eq!(doc.title, "Evening run #night");
        // Stored tags are kept, the new hashtag is added
        assert!(doc.tags.contains(&"night".to_string()));
        assert!(doc.tags.contains(&"fitness".to_string()));
        assert!(doc.tags.contains(&"outdoors".to_string()));
        assert_eq!(doc.description, "Along the river #outdoors");
    }

    #[tokio::test]
    async fn test_update_video_with_supplied_tags() {
        let (sync, videos) = synchronizer(SyncConfig::default()).await;
        sync.create_video(create_payload("v1")).await.unwrap();

        let update = UpdateVideo {
            id: "v1".to_string(),
            description: Some("no hashtags here".to_string()),
            tags: Some(vec!["#news".to_string()]),
            ..Default::default()
        };
        sync.update_video(update).await.unwrap();

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert_eq!(doc.tags, vec!["fitness", "news"]);
    }

    #[tokio::test]
    async fn test_update_video_without_recompute_writes_fields_verbatim() {
        let config = SyncConfig {
            recompute_tags_on_update: false,
            ..Default::default()
        };
        let (sync, videos) = synchronizer(config).await;
        sync.create_video(create_payload("v1")).await.unwrap();

        let update = UpdateVideo {
            id: "v1".to_string(),
            title: Some("Evening #night".to_string()),
            ..Default::default()
        };
        sync.update_video(update).await.unwrap();

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert!(!doc.tags.contains(&"night".to_string()));
    }

    #[tokio::test]
    async fn test_update_missing_video_is_discarded() {
        let (sync, _) = synchronizer(SyncConfig::default()).await;
        let update = UpdateVideo {
            id: "nope".to_string(),
            title: Some("x".to_string()),
            ..Default::default()
        };
        assert_eq!(
            sync.update_video(update).await.unwrap(),
            SyncOutcome::DiscardedMissing
        );
    }

    #[tokio::test]
    async fn test_lifecycle_is_monotonic() {
        let (sync, videos) = synchronizer(SyncConfig::default()).await;
        sync.create_video(create_payload("v1")).await.unwrap();

        let unregister = UnregisterVideo {
            video_id: "v1".to_string(),
        };
        assert_eq!(
            sync.unregister_video(unregister.clone()).await.unwrap(),
            SyncOutcome::Applied
        );
        assert_eq!(
            sync.unregister_video(unregister).await.unwrap(),
            SyncOutcome::DiscardedTerminal
        );

        let update = UpdateVideo {
            id: "v1".to_string(),
            status: Some(VideoStatus::Registered),
            title: Some("back".to_string()),
            ..Default::default()
        };
        assert_eq!(
            sync.update_video(update).await.unwrap(),
            SyncOutcome::DiscardedTerminal
        );
        assert_eq!(
            sync.update_video_metrics(metrics("v1", 5, Some(at(1)))).await.unwrap(),
            SyncOutcome::DiscardedTerminal
        );

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert_eq!(doc.status, VideoStatus::Unregistered);
        assert_eq!(doc.title, "Morning run #fitness");
    }

    #[tokio::test]
    async fn test_unregister_missing_video_is_discarded() {
        let (sync, _) = synchronizer(SyncConfig::default()).await;
        let outcome = sync
            .unregister_video(UnregisterVideo {
                video_id: "nope".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::DiscardedMissing);
    }

    #[tokio::test]
    async fn test_metrics_out_of_order_keeps_newest() {
        let (sync, videos) = synchronizer(SyncConfig::default()).await;
        sync.create_video(create_payload("v1")).await.unwrap();

        assert_eq!(
            sync.update_video_metrics(metrics("v1", 20, Some(at(2)))).await.unwrap(),
            SyncOutcome::Applied
        );
        assert_eq!(
            sync.update_video_metrics(metrics("v1", 10, Some(at(1)))).await.unwrap(),
            SyncOutcome::DiscardedStale
        );
        assert_eq!(
            sync.update_video_metrics(metrics("v1", 20, Some(at(2)))).await.unwrap(),
            SyncOutcome::DiscardedStale
        );

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert_eq!(doc.metrics.views_count, 20);
        assert_eq!(doc.metrics.views_count_updated_at, Some(at(2)));
    }

    #[tokio::test]
    async fn test_metrics_in_order_applies_both() {
        let (sync, videos) = synchronizer(SyncConfig::default()).await;
        sync.create_video(create_payload("v1")).await.unwrap();

        sync.update_video_metrics(metrics("v1", 10, Some(at(1)))).await.unwrap();
        sync.update_video_metrics(metrics("v1", 20, Some(at(2)))).await.unwrap();

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert_eq!(doc.metrics.views_count, 20);
    }

    #[tokio::test]
    async fn test_metrics_without_timestamp() {
        let (sync, _) = synchronizer(SyncConfig::default()).await;
        sync.create_video(create_payload("v1")).await.unwrap();
        assert_eq!(
            sync.update_video_metrics(metrics("v1", 3, None)).await.unwrap(),
            SyncOutcome::DiscardedStale
        );

        let loose = SyncConfig {
            metrics_staleness_guard: false,
            ..Default::default()
        };
        let (sync, videos) = synchronizer(loose).await;
        sync.create_video(create_payload("v1")).await.unwrap();
        sync.update_video_metrics(metrics("v1", 7, Some(at(5)))).await.unwrap();
        assert_eq!(
            sync.update_video_metrics(metrics("v1", 3, Some(at(1)))).await.unwrap(),
            SyncOutcome::Applied
        );
        assert_eq!(
            sync.update_video_metrics(metrics("v1", 4, None)).await.unwrap(),
            SyncOutcome::Applied
        );

        let doc = videos.get("v1").await.unwrap().unwrap();
        assert_eq!(doc.metrics.views_count, 4);
        assert!(doc.metrics.views_count_updated_at.is_some());
    }

    #[tokio::test]
    async fn test_metrics_for_missing_video() {
        let (sync, _) = synchronizer(SyncConfig::default()).await;
        assert_eq!(
            sync.update_video_metrics(metrics("nope", 1, Some(at(1)))).await.unwrap(),
            SyncOutcome::DiscardedMissing
        );
    }
}
