//! Orchestrator module for the video search ingest.
//!
//! Coordinates the consumer and the event processor, and acknowledges batches back to the
//! consumer once every event of the batch completed.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{IndexEvent, StreamMessage};
use crate::errors::IngestError;
use crate::processor::EventProcessor;
use crate::sync::SyncStats;

/// Source of event batches driven by the orchestrator.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Subscribe to the event source.
    fn subscribe(&self) -> Result<(), IngestError>;

    /// Stream batches into `sender` until the source ends or `shutdown` fires, committing the
    /// batches acknowledged on `ack_receiver`.
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        ack_receiver: mpsc::Receiver<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError>;
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffer.
    pub channel_buffer_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
        }
    }
}

/// Orchestrator that coordinates the ingest components.
///
/// The orchestrator:
/// - Manages the lifecycle of the consumer
/// - Applies each batch through the processor
/// - Acknowledges a batch only when all of its events completed
/// - Handles shutdown signals
pub struct Orchestrator {
    consumer: Arc<dyn Consumer>,
    processor: EventProcessor,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    /// Total number of events processed since startup.
    total_events_processed: Arc<AtomicU64>,
    /// Total number of batches that failed and were not acknowledged.
    total_batches_failed: Arc<AtomicU64>,
    stats: Arc<SyncStats>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(consumer: Arc<dyn Consumer>, processor: EventProcessor) -> Self {
        Self::with_config(consumer, processor, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        consumer: Arc<dyn Consumer>,
        processor: EventProcessor,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let stats = processor.stats();

        Self {
            consumer,
            processor,
            config,
            shutdown_tx,
            total_events_processed: Arc::new(AtomicU64::new(0)),
            total_batches_failed: Arc::new(AtomicU64::new(0)),
            stats,
        }
    }

    /// Run the orchestrator.
    ///
    /// Blocks until the consumer stream ends, a shutdown is triggered or ctrl-c is received.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), IngestError> {
        info!("Starting video search orchestrator");

        self.consumer.subscribe()?;

        let (event_transmitter, mut event_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);
        let (ack_transmitter, ack_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        let consumer = Arc::clone(&self.consumer);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let mut shutdown_signal = self.shutdown_tx.subscribe();

        let consumer_handle = tokio::spawn(async move {
            if let Err(e) = consumer
                .run(event_transmitter, ack_receiver, shutdown_rx)
                .await
            {
                error!(error = %e, "Consumer error");
            }
        });

        info!("Ready to process events");

        let mut progress_timer = interval(Duration::from_secs(10));
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut prev_events: u64 = 0;
        let mut prev_time = std::time::Instant::now();

        loop {
            tokio::select! {
                msg = event_receiver.recv() => {
                    match msg {
                        Some(StreamMessage::Events { events, offsets }) => {
                            debug!(
                                event_count = events.len(),
                                offset_count = offsets.len(),
                                "Received events from consumer"
                            );
                            let ack = match self.process_events(events).await {
                                Ok(()) => StreamMessage::Acknowledgment {
                                    offsets,
                                    success: true,
                                    error: None,
                                },
                                Err(e) => {
                                    self.total_batches_failed.fetch_add(1, Ordering::Relaxed);
                                    error!(error = %e, "Failed to process events. Withholding acknowledgment");
                                    StreamMessage::Acknowledgment {
                                        offsets,
                                        success: false,
                                        error: Some(e.to_string()),
                                    }
                                }
                            };
                            let _ = ack_transmitter.send(ack).await;
                        }
                        Some(StreamMessage::Error(e)) => {
                            error!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                        Some(StreamMessage::Acknowledgment { .. }) => {
                            warn!("Received acknowledgment on event channel (should be on ack channel)");
                        }
                    }
                }
                _ = shutdown_signal.recv() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = progress_timer.tick() => {
                    let events = self.total_events_processed.load(Ordering::Relaxed);
                    let snapshot = self.stats.snapshot();

                    let now = std::time::Instant::now();
                    let elapsed_secs = now.duration_since(prev_time).as_secs_f64();
                    let events_per_sec = if elapsed_secs > 0.0 {
                        (events.saturating_sub(prev_events) as f64) / elapsed_secs
                    } else {
                        0.0
                    };

                    info!(
                        events_processed = events,
                        applied = snapshot.applied,
                        discarded_missing = snapshot.discarded_missing,
                        discarded_terminal = snapshot.discarded_terminal,
                        discarded_stale = snapshot.discarded_stale,
                        batches_failed = self.total_batches_failed.load(Ordering::Relaxed),
                        events_per_sec = format!("{:.2}", events_per_sec),
                        "Processing progress"
                    );

                    prev_events = events;
                    prev_time = now;
                }
            }
        }

        // Unacknowledged batches are re-consumed on next startup (at-least-once delivery).
        drop(ack_transmitter);
        let _ = consumer_handle.await;

        let snapshot = self.stats.snapshot();
        info!(
            total_events_processed = self.total_events_processed.load(Ordering::Relaxed),
            applied = snapshot.applied,
            discarded = snapshot.discarded(),
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Apply a batch. Returns Ok only once every event has been written or discarded.
    async fn process_events(&self, events: Vec<IndexEvent>) -> Result<(), IngestError> {
        if events.is_empty() {
            debug!("Batch carries no events");
            return Ok(());
        }

        let outcomes = self.processor.process_batch(events).await?;
        self.total_events_processed
            .fetch_add(outcomes.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Outcome counters of the events applied so far.
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
