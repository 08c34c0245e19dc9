//! # Video Search
//!
//! Keeps the `videos` and `creators` search indexes in sync with domain events consumed from
//! Kafka, and serves federated read queries over them through an HTTP API.
//!
//! ## Architecture
//!
//! The write side follows the Consumer-Processor pattern:
//!
//! 1. **Consumer**: Receives event envelopes from Kafka
//! 2. **Processor**: Routes each event to its synchronizer
//! 3. **Synchronizers**: Apply guarded mutations to the indexes
//! 4. **Orchestrator**: Coordinates the ingest flow and offset acknowledgment
//!
//! The read side is the query engine, which filters, ranks and paginates videos and joins their
//! creators in one extra query per page.
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Kafka consumer for index events
//! - [`processor`]: Dispatches events to the synchronizers
//! - [`sync`]: Video and creator synchronizers
//! - [`orchestrator`]: Coordinates the ingest flow
//! - [`provisioner`]: Index settings and creation
//! - [`federation`]: Query engine and creator enrichment
//! - [`server`]: HTTP routes
//! - [`indexes`]: Typed handles over the indexes
//! - [`errors`]: Error types

pub mod config;
pub mod consumer;
pub mod errors;
pub mod federation;
pub mod indexes;
pub mod orchestrator;
pub mod processor;
pub mod provisioner;
pub mod server;
pub mod sync;

pub use config::Dependencies;
pub use errors::{IngestError, QueryError};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// The indexes could not be created.
    #[error("Provisioning error: {0}")]
    ProvisioningError(String),

    /// The HTTP server failed.
    #[error("Server error: {0}")]
    ServerError(String),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a provisioning error.
    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::ProvisioningError(msg.into())
    }

    /// Create a server error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }
}
