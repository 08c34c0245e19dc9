//! HTTP tests for the search routes.

mod common;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use video_search::federation::{QueryConfig, QueryEngine};
use video_search::indexes::{CreatorsIndex, VideosIndex};
use video_search::processor::EventProcessor;
use video_search::server::create_app;
use video_search::sync::SyncConfig;
use video_search_repository::{
    DocumentQuery, DocumentStore, DocumentStoreError, IndexSettings, QueryResult,
};

use common::{create_video_event, provisioned_store, query_engine, upsert_creator_event, video_id};

async fn seeded_app() -> Router {
    let store = provisioned_store().await;
    let processor = EventProcessor::new(Arc::new(store.clone()), SyncConfig::default());
    processor
        .process_batch(vec![
            upsert_creator_event("c1", "Alice"),
            create_video_event(1, "c1", "Morning #coffee"),
            create_video_event(2, "c1", "Evening #coffee #tea"),
            create_video_event(3, "c2", "Plain video"),
        ])
        .await
        .unwrap();
    create_app(query_engine(&store))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = seeded_app().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_latest_page_shape() {
    let (status, body) = send(seeded_app().await, get("/search/latest?page=1&perPage=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["perPage"], 2);
    assert_eq!(body["totalHits"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["hits"][0]["id"], video_id(3));
    assert_eq!(body["hits"][0]["creator"], json!({}));
    assert_eq!(body["hits"][1]["creator"]["displayName"], "Alice");
    assert_eq!(body["hits"][1]["metrics"]["viewsCount"], "0");
    assert_eq!(body["facetDistribution"]["tags"]["coffee"], 2);
}

#[tokio::test]
async fn test_invalid_pagination_is_bad_request() {
    for uri in [
        "/search/latest?page=0",
        "/search/latest?perPage=101",
        "/search/latest?page=abc",
    ] {
        let (status, body) = send(seeded_app().await, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], "error");
    }
}

#[tokio::test]
async fn test_page_past_result_window_is_empty() {
    let (status, body) = send(
        seeded_app().await,
        get("/search/latest?page=101&perPage=100"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hits"], json!([]));
    assert_eq!(body["totalHits"], 3);
    assert_eq!(body["page"], 101);
}

#[tokio::test]
async fn test_search_requires_query() {
    let (status, _) = send(seeded_app().await, get("/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(seeded_app().await, get("/search?q=%20%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(seeded_app().await, get("/search?q=evening")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalHits"], 1);
    assert_eq!(body["hits"][0]["id"], video_id(2));
}

#[tokio::test]
async fn test_search_by_tags() {
    let (status, body) = send(
        seeded_app().await,
        post_json("/search/by-tags", json!({"tags": ["#tea"], "perPage": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalHits"], 1);
    assert_eq!(body["perPage"], 5);
    assert!(body.get("facetDistribution").is_none());

    let (status, body) = send(
        seeded_app().await,
        post_json("/search/by-tags", json!({"tags": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "at least one tag is required");

    let (status, _) = send(
        seeded_app().await,
        post_json("/search/by-tags", json!({"tags": "tea"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_related() {
    let uri = format!("/search/related/{}", video_id(1));
    let (status, body) = send(seeded_app().await, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalHits"], 1);
    assert_eq!(body["hits"][0]["id"], video_id(2));

    let (status, _) = send(seeded_app().await, get("/search/related/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/search/related/{}", video_id(404));
    let (status, body) = send(seeded_app().await, get(&missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Video not found");
}

#[tokio::test]
async fn test_trending_tags() {
    let (status, body) = send(
        seeded_app().await,
        get("/search/trending-tags?maxTagsCount=1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"tag": "coffee", "count": 2}]));

    let (status, _) = send(seeded_app().await, get("/search/trending-tags")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        seeded_app().await,
        get("/search/trending-tags?maxTagsCount=500"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

struct DownStore;

#[async_trait]
impl DocumentStore for DownStore {
    async fn ensure_index(&self, _settings: &IndexSettings) -> Result<(), DocumentStoreError> {
        Ok(())
    }

    async fn get_document(
        &self,
        _index: &str,
        _id: &str,
    ) -> Result<Option<Value>, DocumentStoreError> {
        Err(DocumentStoreError::connection("timed out"))
    }

    async fn put_document(
        &self,
        _index: &str,
        _id: &str,
        _document: &Value,
    ) -> Result<(), DocumentStoreError> {
        Err(DocumentStoreError::connection("timed out"))
    }

    async fn create_document(
        &self,
        _index: &str,
        _id: &str,
        _document: &Value,
    ) -> Result<(), DocumentStoreError> {
        Err(DocumentStoreError::connection("timed out"))
    }

    async fn update_document(
        &self,
        _index: &str,
        _id: &str,
        _partial: &Value,
    ) -> Result<(), DocumentStoreError> {
        Err(DocumentStoreError::connection("timed out"))
    }

    async fn query(
        &self,
        _index: &str,
        _query: &DocumentQuery,
    ) -> Result<QueryResult, DocumentStoreError> {
        Err(DocumentStoreError::connection("timed out"))
    }
}

#[tokio::test]
async fn test_store_failure_is_service_unavailable() {
    let store: Arc<dyn DocumentStore> = Arc::new(DownStore);
    let app = create_app(QueryEngine::new(
        VideosIndex::new(store.clone()),
        CreatorsIndex::new(store.clone()),
        QueryConfig::default(),
    ));

    let (status, body) = send(app.clone(), get("/search/latest")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");

    let uri = format!("/search/related/{}", video_id(1));
    let (status, _) = send(app, get(&uri)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
