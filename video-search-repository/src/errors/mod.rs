//! Error types for the video search repository.
//!
//! This module provides a unified error type for all document store operations.

mod document_store_error;

pub use document_store_error::DocumentStoreError;
