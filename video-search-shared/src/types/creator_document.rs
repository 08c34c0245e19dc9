//! Creator document stored in the `creators` index.

use serde::{Deserialize, Serialize};

/// Document representation of a creator.
///
/// Creators have no lifecycle: they are created or refreshed by upsert events and
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorDocument {
    pub id: String,
    pub display_name: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}
