//! Mapping of query errors to HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::errors::QueryError;

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            warn!(error = %self, "Rejected query");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self, "Query failed");
            StatusCode::SERVICE_UNAVAILABLE
        };

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<QueryRejection> for QueryError {
    fn from(rejection: QueryRejection) -> Self {
        QueryError::invalid_input(rejection.body_text())
    }
}

impl From<JsonRejection> for QueryError {
    fn from(rejection: JsonRejection) -> Self {
        QueryError::invalid_input(rejection.body_text())
    }
}

impl From<PathRejection> for QueryError {
    fn from(rejection: PathRejection) -> Self {
        QueryError::invalid_input(rejection.body_text())
    }
}
