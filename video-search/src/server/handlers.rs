//! HTTP request handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use video_search_shared::{Pagination, TrendingTag, VideoPage};

use crate::errors::QueryError;
use crate::server::state::AppState;

/// Paging parameters shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageParams {
    fn pagination(&self) -> Result<Pagination, QueryError> {
        Pagination::new(self.page, self.per_page).map_err(QueryError::invalid_input)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchByTagsRequest {
    pub tags: Vec<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTagsParams {
    pub max_tags_count: Option<u64>,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn search_latest(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<VideoPage>, QueryError> {
    let Query(params) = params?;
    let page = state.engine.search_latest(params.pagination()?).await?;
    Ok(Json(page))
}

pub async fn search_by_query(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<VideoPage>, QueryError> {
    let Query(params) = params?;
    let q = params
        .q
        .ok_or_else(|| QueryError::invalid_input("q is required"))?;
    let pagination =
        Pagination::new(params.page, params.per_page).map_err(QueryError::invalid_input)?;
    let page = state.engine.search_by_query(&q, pagination).await?;
    Ok(Json(page))
}

pub async fn search_by_tags(
    State(state): State<AppState>,
    body: Result<Json<SearchByTagsRequest>, JsonRejection>,
) -> Result<Json<VideoPage>, QueryError> {
    let Json(body) = body?;
    let pagination =
        Pagination::new(body.page, body.per_page).map_err(QueryError::invalid_input)?;
    let page = state.engine.search_by_tags(&body.tags, pagination).await?;
    Ok(Json(page))
}

pub async fn search_related(
    State(state): State<AppState>,
    video_id: Result<Path<String>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<VideoPage>, QueryError> {
    let Path(video_id) = video_id?;
    let Query(params) = params?;
    let page = state
        .engine
        .search_related(&video_id, params.pagination()?)
        .await?;
    Ok(Json(page))
}

pub async fn trending_tags(
    State(state): State<AppState>,
    params: Result<Query<TrendingTagsParams>, QueryRejection>,
) -> Result<Json<Vec<TrendingTag>>, QueryError> {
    let Query(params) = params?;
    let max_tags_count = params
        .max_tags_count
        .ok_or_else(|| QueryError::invalid_input("maxTagsCount is required"))?;
    let tags = state.engine.trending_tags(max_tags_count).await?;
    Ok(Json(tags))
}
