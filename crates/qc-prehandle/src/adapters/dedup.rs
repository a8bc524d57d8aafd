//! Transaction id deduplication cache.
//!
//! Lock-free concurrent map of transaction id to first-seen time. Entries
//! are kept for a retention window; the owner decides when to purge.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::TransactionId;
use tracing::debug;

use crate::ports::outbound::DeduplicationRegistry;

/// Concurrent dedup registry with time-based retention.
pub struct DeduplicationCache {
    entries: DashMap<TransactionId, Instant>,
    retention: Duration,
}

impl DeduplicationCache {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Drop entries older than the retention window. Returns how many were
    /// removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let retention = self.retention;
        self.entries.retain(|_, seen| seen.elapsed() < retention);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Purged dedup entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DeduplicationRegistry for DeduplicationCache {
    fn add(&self, id: &TransactionId) -> bool {
        match self.entries.entry(id.clone()) {
            // An expired entry counts as absent, matching `contains`.
            Entry::Occupied(mut seen) if seen.get().elapsed() >= self.retention => {
                seen.insert(Instant::now());
                true
            }
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                true
            }
        }
    }

    fn contains(&self, id: &TransactionId) -> bool {
        self.entries
            .get(id)
            .is_some_and(|seen| seen.elapsed() < self.retention)
    }
}
