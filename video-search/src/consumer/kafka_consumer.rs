//! Kafka consumer implementation for the video search indexer.
//!
//! Consumes JSON event envelopes from Kafka topics and forwards them to the orchestrator in
//! batches. Offsets are committed only once the orchestrator acknowledges a batch. A rejected
//! batch rewinds its partitions so the messages are consumed again.

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer as _, StreamConsumer},
    message::{BorrowedMessage, Message as KafkaMessage},
    Offset, TopicPartitionList,
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::messages::{IndexEvent, StreamMessage};
use crate::consumer::redelivery::{earliest_offsets, AckAction, BatchTracker, MessageOffset};
use crate::errors::IngestError;
use crate::orchestrator::Consumer;

/// Default topic carrying video and creator events.
pub const DEFAULT_EVENTS_TOPIC: &str = "video-search.events";

/// Default batch size for Kafka message batching.
const DEFAULT_BATCH_SIZE: usize = 50;

/// Default batch timeout in milliseconds.
const DEFAULT_BATCH_TIMEOUT_MS: u64 = 1000;

/// Timeout for seeking a partition back after a rejected batch.
const SEEK_TIMEOUT: Duration = Duration::from_secs(10);

/// Kafka consumer for index events.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topics: Vec<String>,
    batch_size: usize,
    batch_timeout: Duration,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    /// * `topics` - Topics to subscribe to
    pub fn new(brokers: &str, group_id: &str, topics: Vec<String>) -> Result<Self, IngestError> {
        Self::with_batch_config(
            brokers,
            group_id,
            topics,
            DEFAULT_BATCH_SIZE,
            DEFAULT_BATCH_TIMEOUT_MS,
        )
    }

    /// Create a new Kafka consumer with custom batch configuration.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    /// * `topics` - Topics to subscribe to
    /// * `batch_size` - Number of messages to batch before sending
    /// * `batch_timeout_ms` - Maximum time to wait before flushing a partial batch (milliseconds)
    pub fn with_batch_config(
        brokers: &str,
        group_id: &str,
        topics: Vec<String>,
        batch_size: usize,
        batch_timeout_ms: u64,
    ) -> Result<Self, IngestError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        let topics = if topics.is_empty() {
            vec![DEFAULT_EVENTS_TOPIC.to_string()]
        } else {
            topics
        };

        info!(
            brokers = %brokers,
            group_id = %group_id,
            topics = ?topics,
            batch_size = batch_size,
            batch_timeout_ms = batch_timeout_ms,
            "Created Kafka consumer with batching"
        );

        Ok(Self {
            consumer,
            topics,
            batch_size: batch_size.max(1),
            batch_timeout: Duration::from_millis(batch_timeout_ms),
        })
    }

    /// Flush the pending batch to the orchestrator.
    ///
    /// Offsets of messages that carried no usable event travel with the batch so they are
    /// committed in order with it.
    async fn flush_batch(
        &self,
        events: &mut Vec<IndexEvent>,
        offsets: &mut Vec<MessageOffset>,
        tracker: &mut BatchTracker,
        sender: &mpsc::Sender<StreamMessage>,
    ) -> Result<(), IngestError> {
        if offsets.is_empty() {
            return Ok(());
        }

        info!(
            event_count = events.len(),
            offset_count = offsets.len(),
            "Sending batch of events to processor"
        );
        let offsets = std::mem::take(offsets);
        tracker.sent(offsets.clone());
        sender
            .send(StreamMessage::Events {
                events: std::mem::take(events),
                offsets,
            })
            .await
            .map_err(|e| IngestError::channel(e.to_string()))
    }

    /// Seek partitions back so their uncommitted messages are consumed again.
    fn rewind(&self, positions: &[MessageOffset]) -> Result<(), IngestError> {
        for (topic, partition, offset) in positions {
            self.consumer
                .seek(topic, *partition, Offset::Offset(*offset), SEEK_TIMEOUT)
                .map_err(|e| IngestError::kafka(e.to_string()))?;
            warn!(
                topic = %topic,
                partition = partition,
                offset = offset,
                "Rewound partition for redelivery"
            );
        }
        Ok(())
    }

    /// Commit offsets for a batch of messages.
    fn commit_offsets(&self, offsets: &[MessageOffset]) -> Result<(), IngestError> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut tpl = TopicPartitionList::new();
        for (topic, partition, offset) in offsets {
            tpl.add_partition_offset(topic, *partition, Offset::Offset(offset + 1))
                .map_err(|e| IngestError::kafka(e.to_string()))?;
        }

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        Ok(())
    }

    /// Decode a Kafka message into an event. Undecodable messages are logged and yield `None`.
    fn parse_message(&self, msg: &BorrowedMessage<'_>) -> Option<IndexEvent> {
        let payload = match msg.payload() {
            Some(p) => p,
            None => {
                debug!(
                    topic = %msg.topic(),
                    partition = msg.partition(),
                    offset = msg.offset(),
                    "Received message with empty payload"
                );
                return None;
            }
        };

        match IndexEvent::decode(payload) {
            Ok(event) => {
                debug!(
                    pattern = event.pattern(),
                    target_id = %event.target_id(),
                    "Decoded event"
                );
                Some(event)
            }
            Err(e) => {
                warn!(
                    topic = %msg.topic(),
                    partition = msg.partition(),
                    offset = msg.offset(),
                    error = %e,
                    "Skipping undecodable message"
                );
                None
            }
        }
    }
}

#[async_trait]
impl Consumer for KafkaConsumer {
    /// Subscribe to configured topics.
    fn subscribe(&self) -> Result<(), IngestError> {
        let topics: Vec<&str> = self.topics.iter().map(|s| s.as_str()).collect();
        self.consumer
            .subscribe(&topics)
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        info!(topics = ?self.topics, "Subscribed to Kafka topics");
        Ok(())
    }

    /// Start consuming messages and send them through the channel in batches.
    #[instrument(skip(self, sender, ack_receiver, shutdown))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        use futures::StreamExt;

        let mut message_stream = self.consumer.stream();
        let mut events: Vec<IndexEvent> = Vec::with_capacity(self.batch_size);
        let mut pending_offsets: Vec<MessageOffset> = Vec::with_capacity(self.batch_size);
        let mut tracker = BatchTracker::new();
        let mut flush_timer = tokio::time::interval(self.batch_timeout);
        flush_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Skip the first tick immediately
        flush_timer.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    // Pending messages are not committed and will be re-read on restart
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
                ack_msg = ack_receiver.recv() => {
                    match ack_msg {
                        Some(StreamMessage::Acknowledgment { offsets, success, error }) => {
                            match tracker.acknowledge(success) {
                                AckAction::Commit(committed) => {
                                    if let Err(e) = self.commit_offsets(&committed) {
                                        error!(error = %e, "Failed to commit offsets after acknowledgment");
                                    } else {
                                        debug!(offset_count = committed.len(), "Committed offsets after successful processing");
                                    }
                                }
                                AckAction::Rewind(positions) => {
                                    error!(
                                        offset_count = offsets.len(),
                                        error = error.as_deref().unwrap_or("Unknown error"),
                                        "Not committing offsets due to processing failure"
                                    );
                                    // Buffered messages come after the rewound positions
                                    let positions = earliest_offsets([
                                        positions.as_slice(),
                                        pending_offsets.as_slice(),
                                    ]);
                                    events.clear();
                                    pending_offsets.clear();
                                    self.rewind(&positions)?;
                                }
                                AckAction::Ignore => {
                                    debug!(
                                        offset_count = offsets.len(),
                                        "Ignoring acknowledgment of a batch pending redelivery"
                                    );
                                }
                            }
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Acknowledgment channel closed");
                            break;
                        }
                        _ => {}
                    }
                }
                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            debug!(
                                topic = %msg.topic(),
                                partition = msg.partition(),
                                offset = msg.offset(),
                                "Received message from Kafka"
                            );
                            if let Some(event) = self.parse_message(&msg) {
                                events.push(event);
                            }
                            pending_offsets.push((msg.topic().to_string(), msg.partition(), msg.offset()));

                            if pending_offsets.len() >= self.batch_size {
                                self.flush_batch(&mut events, &mut pending_offsets, &mut tracker, &sender).await?;
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka error");
                            let _ = sender.send(StreamMessage::Error(e.to_string())).await;
                        }
                        None => {
                            info!("Kafka stream ended");
                            self.flush_batch(&mut events, &mut pending_offsets, &mut tracker, &sender).await?;
                            let _ = sender.send(StreamMessage::End).await;
                            break;
                        }
                    }
                }
                _ = flush_timer.tick() => {
                    if !pending_offsets.is_empty() {
                        debug!(count = pending_offsets.len(), "Flushing batch due to timeout");
                        self.flush_batch(&mut events, &mut pending_offsets, &mut tracker, &sender).await?;
                    }
                }
            }
        }

        Ok(())
    }
}
