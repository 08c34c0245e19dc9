//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use video_search::consumer::IndexEvent;
use video_search::federation::{QueryConfig, QueryEngine};
use video_search::indexes::{CreatorsIndex, VideosIndex};
use video_search::provisioner::IndexProvisioner;
use video_search_repository::InMemoryDocumentStore;
use video_search_shared::{CreateVideo, UpsertCreator, VideoStatus, VideoVisibility};

pub async fn provisioned_store() -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    IndexProvisioner::new(Arc::new(store.clone()))
        .provision()
        .await
        .unwrap();
    store
}

pub fn query_engine(store: &InMemoryDocumentStore) -> QueryEngine {
    QueryEngine::new(
        VideosIndex::new(Arc::new(store.clone())),
        CreatorsIndex::new(Arc::new(store.clone())),
        QueryConfig::default(),
    )
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap()
}

/// A deterministic UUID for fixture `n`.
pub fn video_id(n: u32) -> String {
    format!("00000000-0000-4000-8000-{:012}", n)
}

pub fn create_video(n: u32, creator_id: &str, title: &str) -> CreateVideo {
    CreateVideo {
        id: video_id(n),
        creator_id: creator_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        tags: None,
        thumbnail_url: format!("https://cdn.example.com/{}.png", n),
        preview_thumbnail_url: format!("https://cdn.example.com/{}.gif", n),
        length_seconds: 60,
        visibility: VideoVisibility::Public,
        status: VideoStatus::Registered,
        created_at: at(n % 60),
    }
}

pub fn create_video_event(n: u32, creator_id: &str, title: &str) -> IndexEvent {
    IndexEvent::CreateVideo(create_video(n, creator_id, title))
}

pub fn upsert_creator_event(id: &str, display_name: &str) -> IndexEvent {
    IndexEvent::UpsertCreator(UpsertCreator {
        id: id.to_string(),
        display_name: display_name.to_string(),
        nickname: display_name.to_lowercase(),
        thumbnail_url: None,
    })
}
