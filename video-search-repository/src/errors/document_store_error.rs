//! Document store error types.

use thiserror::Error;

/// Unified errors from document store operations.
///
/// Used by the `DocumentStore` trait and every backend implementing it. Backend failures
/// (connection, unexpected responses) and store-level conditions (missing or conflicting
/// documents) share this type so callers can branch on them without knowing the backend.
#[derive(Debug, Clone, Error)]
pub enum DocumentStoreError {
    /// Validation error (e.g., unknown index, malformed document).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the store backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create or configure an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to read a document.
    #[error("Get error: {0}")]
    GetError(String),

    /// Failed to write a document.
    #[error("Write error: {0}")]
    WriteError(String),

    /// Failed to run a query.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse response from the store backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the store backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Document not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Insert-only create hit an existing document.
    #[error("Document already exists: {0}")]
    DocumentExists(String),

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DocumentStoreError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a get error.
    pub fn get(msg: impl Into<String>) -> Self {
        Self::GetError(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a document not found error.
    pub fn document_not_found(index: &str, id: &str) -> Self {
        Self::DocumentNotFound(format!("index={}, id={}", index, id))
    }

    /// Create a document exists error.
    pub fn document_exists(index: &str, id: &str) -> Self {
        Self::DocumentExists(format!("index={}, id={}", index, id))
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Returns true if an insert-only create lost against an existing document.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DocumentExists(_))
    }

    /// Returns true if the target document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound(_))
    }
}
