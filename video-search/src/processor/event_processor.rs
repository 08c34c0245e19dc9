//! Event processor implementation.
//!
//! Routes each `IndexEvent` to the synchronizer that owns its index and records the outcome.

use std::sync::Arc;
use tracing::{debug, instrument};

use video_search_repository::DocumentStore;

use crate::consumer::IndexEvent;
use crate::errors::IngestError;
use crate::indexes::{CreatorsIndex, VideosIndex};
use crate::sync::{CreatorSynchronizer, SyncConfig, SyncOutcome, SyncStats, VideoSynchronizer};

/// Processor that applies events to the search indexes.
///
/// Events of a batch are applied in delivery order. The first store failure aborts the batch so
/// the orchestrator withholds its acknowledgment.
#[derive(Clone)]
pub struct EventProcessor {
    videos: VideoSynchronizer,
    creators: CreatorSynchronizer,
    stats: Arc<SyncStats>,
}

impl EventProcessor {
    /// Create a processor over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, config: SyncConfig) -> Self {
        Self::from_synchronizers(
            VideoSynchronizer::new(VideosIndex::new(store.clone()), config),
            CreatorSynchronizer::new(CreatorsIndex::new(store)),
        )
    }

    pub fn from_synchronizers(videos: VideoSynchronizer, creators: CreatorSynchronizer) -> Self {
        Self {
            videos,
            creators,
            stats: Arc::new(SyncStats::new()),
        }
    }

    /// Outcome counters shared with the orchestrator's progress log.
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Apply a batch of events in order.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn process_batch(
        &self,
        events: Vec<IndexEvent>,
    ) -> Result<Vec<SyncOutcome>, IngestError> {
        let mut outcomes = Vec::with_capacity(events.len());

        for event in events {
            outcomes.push(self.process_event(event).await?);
        }

        debug!(processed_count = outcomes.len(), "Processed event batch");
        Ok(outcomes)
    }

    /// Apply a single event.
    pub async fn process_event(&self, event: IndexEvent) -> Result<SyncOutcome, IngestError> {
        let pattern = event.pattern();
        let outcome = match event {
            IndexEvent::CreateVideo(payload) => self.videos.create_video(payload).await?,
            IndexEvent::UpdateVideo(payload) => self.videos.update_video(payload).await?,
            IndexEvent::UnregisterVideo(payload) => self.videos.unregister_video(payload).await?,
            IndexEvent::UpdateVideoMetrics(payload) => {
                self.videos.update_video_metrics(payload).await?
            }
            IndexEvent::UpsertCreator(payload) => self.creators.upsert_creator(payload).await?,
        };

        self.stats.record(outcome);
        debug!(pattern = pattern, outcome = %outcome, "Event processed");
        Ok(outcome)
    }
}
