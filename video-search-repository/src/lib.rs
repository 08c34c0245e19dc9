//! # Video Search Repository
//!
//! This crate provides the `DocumentStore` trait used by the video search indexer and query
//! engine, with an OpenSearch implementation and an in-memory implementation for tests and
//! local development.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod types;
pub mod utils;

pub use errors::DocumentStoreError;
pub use interfaces::DocumentStore;
pub use memory::InMemoryDocumentStore;
pub use opensearch::{IndexConfig, OpenSearchProvider};
pub use types::{
    DocumentQuery, FieldKind, FieldMapping, Filter, IndexSettings, QueryResult, RankingRule,
    SortClause, SortKey, SortOrder,
};
