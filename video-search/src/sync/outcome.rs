//! Outcomes of applying an event to the indexes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of a synchronizer operation that did not fail.
///
/// Discards are expected under out-of-order or redelivered events and are never errors: the
/// event is complete and its offset may be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncOutcome {
    /// The mutation was written.
    Applied,
    /// The target document does not exist.
    DiscardedMissing,
    /// The target video is unregistered.
    DiscardedTerminal,
    /// The event is older than the stored state.
    DiscardedStale,
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Applied => "applied",
            SyncOutcome::DiscardedMissing => "discarded_missing",
            SyncOutcome::DiscardedTerminal => "discarded_terminal",
            SyncOutcome::DiscardedStale => "discarded_stale",
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running counters of synchronizer outcomes, shared across tasks.
#[derive(Debug, Default)]
pub struct SyncStats {
    applied: AtomicU64,
    discarded_missing: AtomicU64,
    discarded_terminal: AtomicU64,
    discarded_stale: AtomicU64,
}

/// Point-in-time copy of `SyncStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    pub applied: u64,
    pub discarded_missing: u64,
    pub discarded_terminal: u64,
    pub discarded_stale: u64,
}

impl SyncStatsSnapshot {
    pub fn discarded(&self) -> u64 {
        self.discarded_missing + self.discarded_terminal + self.discarded_stale
    }

    pub fn total(&self) -> u64 {
        self.applied + self.discarded()
    }
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: SyncOutcome) {
        let counter = match outcome {
            SyncOutcome::Applied => &self.applied,
            SyncOutcome::DiscardedMissing => &self.discarded_missing,
            SyncOutcome::DiscardedTerminal => &self.discarded_terminal,
            SyncOutcome::DiscardedStale => &self.discarded_stale,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            applied: self.applied.load(Ordering::Relaxed),
            discarded_missing: self.discarded_missing.load(Ordering::Relaxed),
            discarded_terminal: self.discarded_terminal.load(Ordering::Relaxed),
            discarded_stale: self.discarded_stale.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record_each_outcome() {
        let stats = SyncStats::new();
        stats.record(SyncOutcome::Applied);
        stats.record(SyncOutcome::Applied);
        stats.record(SyncOutcome::DiscardedStale);
        stats.record(SyncOutcome::DiscardedMissing);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.applied, 2);
        assert_eq!(snapshot.discarded_stale, 1);
        assert_eq!(snapshot.discarded_missing, 1);
        assert_eq!(snapshot.discarded_terminal, 0);
        assert_eq!(snapshot.discarded(), 2);
        assert_eq!(snapshot.total(), 4);
    }
}
