//! Video document types for the search index.
//!
//! This module defines the document structure stored in the `videos` index.
//! Field names are camelCase in the external (JSON) representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle status of a video.
///
/// The only accepted transition is `Registered` → `Unregistered`. Once a video is
/// unregistered no further mutation is applied to its document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum VideoStatus {
    #[default]
    Registered,
    Unregistered,
}

impl VideoStatus {
    /// Returns the string stored in the index for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Registered => "Registered",
            VideoStatus::Unregistered => "Unregistered",
        }
    }

    /// Returns true if no further transitions are accepted from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Unregistered)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a video. Only `Public` videos are served by the read surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum VideoVisibility {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl VideoVisibility {
    /// Returns the string stored in the index for this visibility.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoVisibility::Public => "Public",
            VideoVisibility::Unlisted => "Unlisted",
            VideoVisibility::Private => "Private",
        }
    }
}

impl fmt::Display for VideoVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// View metrics attached to a video.
///
/// `views_count` is string-encoded in the index. `views_count_updated_at` is the
/// timestamp of the last accepted metrics event and acts as a logical clock for
/// rejecting out-of-order updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetrics {
    #[serde(with = "string_encoded_u64")]
    pub views_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views_count_updated_at: Option<DateTime<Utc>>,
}

impl VideoMetrics {
    /// Returns true if an update stamped `updated_at` is newer than the stored state.
    ///
    /// An absent stored timestamp is always considered older.
    pub fn accepts_update_at(&self, updated_at: DateTime<Utc>) -> bool {
        match self.views_count_updated_at {
            Some(stored) => updated_at > stored,
            None => true,
        }
    }
}

/// Document representation of a video in the `videos` index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoDocument {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    /// Normalized, deduplicated tags, stored sorted.
    #[serde(default)]
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub preview_thumbnail_url: String,
    pub length_seconds: u64,
    pub visibility: VideoVisibility,
    pub status: VideoStatus,
    #[serde(default)]
    pub metrics: VideoMetrics,
    pub created_at: DateTime<Utc>,
}

impl VideoDocument {
    /// Returns true if the video is in its terminal lifecycle state.
    pub fn is_unregistered(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Serde helpers for a `u64` carried as a decimal string.
///
/// Deserialization also accepts a JSON number so documents written by other
/// producers stay readable.
pub mod string_encoded_u64 {
    use super::*;
    use serde::de::Error;

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNumber {
            String(String),
            Number(u64),
        }

        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| D::Error::custom(format!("invalid viewsCount '{}': {}", s, e))),
            StringOrNumber::Number(n) => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_document() -> VideoDocument {
        VideoDocument {
            id: "0b6a5d3c-94a4-4c4a-9a4f-3f5f7f0f7a11".to_string(),
            creator_id: "c1".to_string(),
            title: "Hello #music".to_string(),
            description: "A description".to_string(),
            tags: vec!["music".to_string()],
            thumbnail_url: "https://cdn.example.com/t.png".to_string(),
            preview_thumbnail_url: "https://cdn.example.com/p.gif".to_string(),
            length_seconds: 42,
            visibility: VideoVisibility::Public,
            status: VideoStatus::Registered,
            metrics: VideoMetrics::default(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_serializes_camel_case_with_string_views_count() {
        let value = serde_json::to_value(sample_document()).unwrap();

        assert_eq!(value["creatorId"], "c1");
        assert_eq!(value["lengthSeconds"], 42);
        assert_eq!(value["visibility"], "Public");
        assert_eq!(value["status"], "Registered");
        assert_eq!(value["metrics"]["viewsCount"], "0");
        assert!(value["metrics"].get("viewsCountUpdatedAt").is_none());
    }

    #[test]
    fn test_views_count_accepts_number_or_string() {
        let from_string: VideoMetrics = serde_json::from_value(json!({"viewsCount": "17"})).unwrap();
        let from_number: VideoMetrics = serde_json::from_value(json!({"viewsCount": 17})).unwrap();

        assert_eq!(from_string.views_count, 17);
        assert_eq!(from_number.views_count, 17);
        assert!(serde_json::from_value::<VideoMetrics>(json!({"viewsCount": "lots"})).is_err());
    }

    #[test]
    fn test_missing_metrics_defaults_to_zero() {
        let mut value = serde_json::to_value(sample_document()).unwrap();
        value.as_object_mut().unwrap().remove("metrics");

        let doc: VideoDocument = serde_json::from_value(value).unwrap();
        assert_eq!(doc.metrics.views_count, 0);
        assert!(doc.metrics.views_count_updated_at.is_none());
    }

    #[test]
    fn test_accepts_update_at() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();

        let fresh = VideoMetrics::default();
        assert!(fresh.accepts_update_at(t1));

        let stamped = VideoMetrics {
            views_count: 5,
            views_count_updated_at: Some(t2),
        };
        assert!(!stamped.accepts_update_at(t1));
        assert!(!stamped.accepts_update_at(t2));
        assert!(stamped.accepts_update_at(t2 + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(!VideoStatus::Registered.is_terminal());
        assert!(VideoStatus::Unregistered.is_terminal());
        assert_eq!(VideoStatus::Unregistered.to_string(), "Unregistered");
    }
}
