//! OpenSearch implementation of the document store.
//!
//! This module provides a concrete implementation of `DocumentStore` using OpenSearch as the
//! backend.

mod index_config;
mod provider;
mod queries;

pub use index_config::IndexConfig;
pub use provider::OpenSearchProvider;
pub use queries::build_search_body;
