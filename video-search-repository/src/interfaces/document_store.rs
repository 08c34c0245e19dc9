//! Document store trait definition.
//!
//! This module defines the abstract interface for keyed document storage with filtered,
//! ranked and faceted queries, allowing for different backend implementations.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::DocumentStoreError;
use crate::types::{DocumentQuery, IndexSettings, QueryResult};

/// Abstracts the underlying document store (OpenSearch, in-memory, etc.).
///
/// Documents are JSON objects keyed by their primary key within a named index. Implementations
/// are injected as `Arc<dyn DocumentStore>` so the synchronizers and the query engine can be
/// tested against the in-memory backend.
///
/// All methods return `Result<T, DocumentStoreError>` for consistent error handling across
/// backends. There are no multi-document transactions.
///
/// # Index Initialization
///
/// `ensure_index` must be called for every index during startup, before any other operation
/// targets it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the index if missing and apply its settings. Idempotent.
    async fn ensure_index(&self, settings: &IndexSettings) -> Result<(), DocumentStoreError>;

    /// Fetch a document by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(document))` - If the document exists
    /// * `Ok(None)` - If it does not
    /// * `Err(DocumentStoreError)` - If the store could not be read
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, DocumentStoreError>;

    /// Write a full document, replacing any existing document with the same id.
    async fn put_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), DocumentStoreError>;

    /// Insert a document only if no document with the same id exists.
    ///
    /// Fails with `DocumentStoreError::DocumentExists` otherwise.
    async fn create_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), DocumentStoreError>;

    /// Merge a partial document into an existing one.
    ///
    /// Nested objects are merged recursively; other values are replaced. Fails with
    /// `DocumentStoreError::DocumentNotFound` if the document does not exist.
    async fn update_document(
        &self,
        index: &str,
        id: &str,
        partial: &Value,
    ) -> Result<(), DocumentStoreError>;

    /// Run a query against an index.
    async fn query(
        &self,
        index: &str,
        query: &DocumentQuery,
    ) -> Result<QueryResult, DocumentStoreError>;
}
