//! Event payloads delivered by the transport layer.
//!
//! Payloads are already shape-validated when they reach the synchronizers. Field
//! names follow the upstream camelCase convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::video_document::{VideoStatus, VideoVisibility};

/// Payload of a `create_video` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideo {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub thumbnail_url: String,
    pub preview_thumbnail_url: String,
    pub length_seconds: u64,
    pub visibility: VideoVisibility,
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload of an `update_video` event: the id plus any subset of the mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VideoVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VideoStatus>,
}

impl UpdateVideo {
    /// Returns the supplied fields, excluding `id` and `tags`, keyed by their
    /// document field names.
    ///
    /// Tags are excluded because they are recomputed by the synchronizer.
    pub fn supplied_fields(&self) -> Map<String, Value> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        fields.remove("id");
        fields.remove("tags");
        fields
    }
}

/// Payload of an `unregister_video` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterVideo {
    pub video_id: String,
}

/// Payload of an `update_video_metrics` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoMetrics {
    pub video_id: String,
    pub views_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload of an `upsert_creator` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCreator {
    pub id: String,
    pub display_name: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_supplied_fields_only_contains_present_values() {
        let update = UpdateVideo {
            id: "v1".to_string(),
            title: Some("New title".to_string()),
            tags: Some(vec!["rust".to_string()]),
            length_seconds: Some(90),
            status: Some(VideoStatus::Unregistered),
            ..Default::default()
        };

        let fields = update.supplied_fields();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields["title"], "New title");
        assert_eq!(fields["lengthSeconds"], 90);
        assert_eq!(fields["status"], "Unregistered");
        assert!(!fields.contains_key("id"));
        assert!(!fields.contains_key("tags"));
    }

    #[test]
    fn test_create_video_tags_are_optional() {
        let payload: CreateVideo = serde_json::from_value(json!({
            "id": "v1",
            "creatorId": "c1",
            "title": "t",
            "description": "d",
            "thumbnailUrl": "a",
            "previewThumbnailUrl": "b",
            "lengthSeconds": 3,
            "visibility": "Unlisted",
            "status": "Registered",
            "createdAt": "2024-03-01T12:00:00Z"
        }))
        .unwrap();

        assert!(payload.tags.is_none());
        assert_eq!(payload.visibility, VideoVisibility::Unlisted);
    }

    #[test]
    fn test_metrics_updated_at_is_optional() {
        let payload: UpdateVideoMetrics =
            serde_json::from_value(json!({"videoId": "v1", "viewsCount": 12})).unwrap();

        assert_eq!(payload.views_count, 12);
        assert!(payload.updated_at.is_none());
    }
}
