//! Consumer module for the video search indexer.
//!
//! Provides Kafka consumer functionality for receiving video and creator events.

mod kafka_consumer;
mod messages;
mod redelivery;

pub use kafka_consumer::KafkaConsumer;
pub use messages::{IndexEvent, StreamMessage};
pub use redelivery::{earliest_offsets, AckAction, BatchTracker, MessageOffset};
