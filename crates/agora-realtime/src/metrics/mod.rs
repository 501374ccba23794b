//! Engine metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total events published on the bus
    pub events_published: AtomicU64,
    /// Total events dropped for malformed payloads
    pub events_malformed: AtomicU64,
    /// Total presence joins applied
    pub presence_joins: AtomicU64,
    /// Total presence leaves applied
    pub presence_leaves: AtomicU64,
    /// Total presence records evicted by retention
    pub presence_evicted: AtomicU64,
    /// Total typing indicators started or refreshed
    pub typing_marks: AtomicU64,
    /// Total typing indicators expired by TTL
    pub typing_expirations: AtomicU64,
    /// Total notifications enqueued
    pub notifications_enqueued: AtomicU64,
    /// Total notifications dropped as duplicates
    pub notifications_deduplicated: AtomicU64,
    /// Total notifications removed by auto-hide
    pub notifications_auto_hidden: AtomicU64,
    /// Total side effects delivered
    pub effects_delivered: AtomicU64,
    /// Total side effects that failed (and were swallowed)
    pub effects_failed: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            events_malformed: self.events_malformed.load(Ordering::Relaxed),
            presence_joins: self.presence_joins.load(Ordering::Relaxed),
            presence_leaves: self.presence_leaves.load(Ordering::Relaxed),
            presence_evicted: self.presence_evicted.load(Ordering::Relaxed),
            typing_marks: self.typing_marks.load(Ordering::Relaxed),
            typing_expirations: self.typing_expirations.load(Ordering::Relaxed),
            notifications_enqueued: self.notifications_enqueued.load(Ordering::Relaxed),
            notifications_deduplicated: self.notifications_deduplicated.load(Ordering::Relaxed),
            notifications_auto_hidden: self.notifications_auto_hidden.load(Ordering::Relaxed),
            effects_delivered: self.effects_delivered.load(Ordering::Relaxed),
            effects_failed: self.effects_failed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total events published on the bus
    pub events_published: u64,
    /// Total events dropped for malformed payloads
    pub events_malformed: u64,
    /// Total presence joins applied
    pub presence_joins: u64,
    /// Total presence leaves applied
    pub presence_leaves: u64,
    /// Total presence records evicted by retention
    pub presence_evicted: u64,
    /// Total typing indicators started or refreshed
    pub typing_marks: u64,
    /// Total typing indicators expired by TTL
    pub typing_expirations: u64,
    /// Total notifications enqueued
    pub notifications_enqueued: u64,
    /// Total notifications dropped as duplicates
    pub notifications_deduplicated: u64,
    /// Total notifications removed by auto-hide
    pub notifications_auto_hidden: u64,
    /// Total side effects delivered
    pub effects_delivered: u64,
    /// Total side effects that failed (and were swallowed)
    pub effects_failed: u64,
}
