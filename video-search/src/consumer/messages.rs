//! Message types for the consumer.
//!
//! Defines the event envelope decoded from Kafka and the messages exchanged between the
//! consumer and the orchestrator.

use serde::{Deserialize, Serialize};

use video_search_shared::{
    CreateVideo, UnregisterVideo, UpdateVideo, UpdateVideoMetrics, UpsertCreator,
};

use crate::errors::IngestError;

/// A domain event, encoded on the wire as `{"pattern": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", content = "data", rename_all = "snake_case")]
pub enum IndexEvent {
    CreateVideo(CreateVideo),
    UpdateVideo(UpdateVideo),
    UnregisterVideo(UnregisterVideo),
    UpdateVideoMetrics(UpdateVideoMetrics),
    UpsertCreator(UpsertCreator),
}

impl IndexEvent {
    /// Decode an event envelope from a message payload.
    pub fn decode(payload: &[u8]) -> Result<Self, IngestError> {
        serde_json::from_slice(payload)
            .map_err(|e| IngestError::parse(format!("Failed to decode event: {}", e)))
    }

    /// The wire name of the event kind.
    pub fn pattern(&self) -> &'static str {
        match self {
            IndexEvent::CreateVideo(_) => "create_video",
            IndexEvent::UpdateVideo(_) => "update_video",
            IndexEvent::UnregisterVideo(_) => "unregister_video",
            IndexEvent::UpdateVideoMetrics(_) => "update_video_metrics",
            IndexEvent::UpsertCreator(_) => "upsert_creator",
        }
    }

    /// Id of the document the event targets.
    pub fn target_id(&self) -> &str {
        match self {
            IndexEvent::CreateVideo(payload) => &payload.id,
            IndexEvent::UpdateVideo(payload) => &payload.id,
            IndexEvent::UnregisterVideo(payload) => &payload.video_id,
            IndexEvent::UpdateVideoMetrics(payload) => &payload.video_id,
            IndexEvent::UpsertCreator(payload) => &payload.id,
        }
    }
}

/// Messages that flow through the ingest.
#[derive(Debug)]
pub enum StreamMessage {
    /// A batch of events with associated offsets for acknowledgment.
    Events {
        events: Vec<IndexEvent>,
        offsets: Vec<(String, i32, i64)>,
    },
    /// Acknowledgment that events were processed.
    Acknowledgment {
        offsets: Vec<(String, i32, i64)>,
        success: bool,
        error: Option<String>,
    },
    /// Stream has ended.
    End,
    /// An error occurred.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_metrics_event() {
        let event = IndexEvent::decode(
            br#"{"pattern":"update_video_metrics","data":{"videoId":"v1","viewsCount":12,"updatedAt":"2024-05-01T10:00:00Z"}}"#,
        )
        .unwrap();

        assert_eq!(event.pattern(), "update_video_metrics");
        assert_eq!(event.target_id(), "v1");
        match event {
            IndexEvent::UpdateVideoMetrics(payload) => {
                assert_eq!(payload.views_count, 12);
                assert!(payload.updated_at.is_some());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_partial_update() {
        let event = IndexEvent::decode(
            br#"{"pattern":"update_video","data":{"id":"v1","visibility":"Private"}}"#,
        )
        .unwrap();

        match event {
            IndexEvent::UpdateVideo(payload) => {
                assert_eq!(payload.id, "v1");
                assert!(payload.title.is_none());
                assert_eq!(payload.supplied_fields().len(), 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_unknown_pattern_and_bad_shape() {
        assert!(IndexEvent::decode(br#"{"pattern":"delete_video","data":{"id":"v1"}}"#).is_err());
        assert!(IndexEvent::decode(br#"{"pattern":"unregister_video","data":{}}"#).is_err());
        assert!(matches!(
            IndexEvent::decode(b"not json"),
            Err(IngestError::ParseError(_))
        ));
    }
}
