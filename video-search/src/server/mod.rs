//! HTTP server exposing the query engine.

mod error;
pub mod handlers;
pub mod state;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::federation::QueryEngine;
use crate::IndexingError;
use self::state::AppState;

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Create the router with all routes and middleware.
pub fn create_app(engine: QueryEngine) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/search", get(handlers::search_by_query))
        .route("/search/latest", get(handlers::search_latest))
        .route("/search/by-tags", post(handlers::search_by_tags))
        .route("/search/related/:video_id", get(handlers::search_related))
        .route("/search/trending-tags", get(handlers::trending_tags))
        .route("/health", get(handlers::health_check))
        .layer(create_cors_layer())
        .with_state(state)
}

/// Serve `app` on `addr` until the process stops.
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), IndexingError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| IndexingError::server(format!("Failed to bind {}: {}", addr, e)))?;

    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| IndexingError::server(e.to_string()))
}
