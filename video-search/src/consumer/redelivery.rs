//! Acknowledgment bookkeeping for batches handed to the orchestrator.
//!
//! Kafka commits are positional: committing offset `n + 1` on a partition covers every earlier
//! offset. Once a batch is rejected, no later batch on the same partitions may be committed
//! until the rejected one has been read again, so a rejection rewinds every uncommitted batch.

use std::collections::{BTreeMap, VecDeque};

/// A `(topic, partition, offset)` position.
pub type MessageOffset = (String, i32, i64);

/// What the consumer should do with an acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckAction {
    /// The batch completed; commit its offsets.
    Commit(Vec<MessageOffset>),
    /// A batch failed; seek each partition back to the given offset.
    Rewind(Vec<MessageOffset>),
    /// The acknowledgment belongs to a batch that is being redelivered.
    Ignore,
}

/// Tracks batches sent to the orchestrator until they are acknowledged.
///
/// Acknowledgments arrive in the order batches were sent.
#[derive(Debug, Default)]
pub struct BatchTracker {
    in_flight: VecDeque<Vec<MessageOffset>>,
    stale_acks: usize,
}

impl BatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch handed to the orchestrator.
    pub fn sent(&mut self, offsets: Vec<MessageOffset>) {
        self.in_flight.push_back(offsets);
    }

    /// Number of batches awaiting an acknowledgment that will be acted on.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Resolve the acknowledgment of the oldest outstanding batch.
    ///
    /// A failure rewinds the failed batch together with every batch sent after it, and the
    /// acknowledgments still pending for those later batches are ignored.
    pub fn acknowledge(&mut self, success: bool) -> AckAction {
        if self.stale_acks > 0 {
            self.stale_acks -= 1;
            return AckAction::Ignore;
        }

        let Some(offsets) = self.in_flight.pop_front() else {
            return AckAction::Ignore;
        };

        if success {
            return AckAction::Commit(offsets);
        }

        let positions = earliest_offsets(
            std::iter::once(offsets.as_slice()).chain(self.in_flight.iter().map(Vec::as_slice)),
        );
        self.stale_acks = self.in_flight.len();
        self.in_flight.clear();
        AckAction::Rewind(positions)
    }
}

/// The lowest offset per partition across `batches`.
pub fn earliest_offsets<'a>(
    batches: impl IntoIterator<Item = &'a [MessageOffset]>,
) -> Vec<MessageOffset> {
    let mut earliest: BTreeMap<(String, i32), i64> = BTreeMap::new();
    for (topic, partition, offset) in batches.into_iter().flatten() {
        earliest
            .entry((topic.clone(), *partition))
            .and_modify(|current| *current = (*current).min(*offset))
            .or_insert(*offset);
    }
    earliest
        .into_iter()
        .map(|((topic, partition), offset)| (topic, partition, offset))
        .collect()
}
