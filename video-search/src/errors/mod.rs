//! Error types for the video search indexer.

use thiserror::Error;

use video_search_repository::DocumentStoreError;

/// Errors that can occur on the event ingest path.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The document store failed; the batch must not be acknowledged.
    #[error("Store error: {0}")]
    StoreError(#[from] DocumentStoreError),

    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// Error parsing or decoding data.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl IngestError {
    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for IngestError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}

/// Errors returned by the query engine.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The caller supplied invalid input.
    #[error("{0}")]
    InvalidInput(String),

    /// The target of a related-content query does not exist.
    #[error("Video not found")]
    VideoNotFound(String),

    /// The document store failed.
    #[error("Store error: {0}")]
    Store(#[from] DocumentStoreError),
}

impl QueryError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Returns true if the error was caused by the request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::VideoNotFound(_))
    }
}
