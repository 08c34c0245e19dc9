//! Processor module for the video search indexer ingest.
//!
//! Dispatches decoded events to the synchronizers.

mod event_processor;

pub use event_processor::EventProcessor;
