//! Shared state of the HTTP server.

use crate::federation::QueryEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: QueryEngine,
}
