//! Priority-governed, bounded notification queue.
//!
//! Insertion order is the only order: priority drives auto-hide duration,
//! side-effect eligibility, and eviction exemption, but never reorders
//! entries. The queue retains at most `2 × max_visible` entries; capacity
//! pressure evicts oldest-first, skipping urgent entries, which only leave
//! by explicit removal.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use agora_core::result::AppResult;
use agora_core::types::id::NotificationId;
use agora_entity::notification::{Notification, NotificationProgress};

use crate::bus::EventBus;
use crate::message::topics;
use crate::message::types::HiddenPayload;
use crate::metrics::EngineMetrics;
use crate::scheduler::Scheduler;

/// What `enqueue` did with the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The notification was inserted at the head.
    Inserted,
    /// A live entry already carries this id; the emission was dropped.
    Deduplicated,
}

/// Bounded most-recent-first notification queue with lifecycle timers.
pub struct NotificationQueue {
    /// Entries, head-first (index 0 is the most recent).
    entries: Mutex<VecDeque<Notification>>,
    /// Timer source for auto-hide.
    scheduler: Arc<Scheduler>,
    /// Bus for `notification:hidden` events.
    bus: Arc<EventBus>,
    /// Metrics collector.
    metrics: Arc<EngineMetrics>,
    /// Visible-window size; retention is twice this.
    max_visible: usize,
    /// Self-handle for timer callbacks.
    weak_self: Weak<NotificationQueue>,
}

impl std::fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("max_visible", &self.max_visible)
            .finish()
    }
}

fn timer_key(id: NotificationId) -> String {
    format!("notify:{id}")
}

impl NotificationQueue {
    /// Create a new queue.
    pub fn new(
        scheduler: Arc<Scheduler>,
        bus: Arc<EventBus>,
        metrics: Arc<EngineMetrics>,
        max_visible: usize,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            entries: Mutex::new(VecDeque::new()),
            scheduler,
            bus,
            metrics,
            max_visible,
            weak_self: weak_self.clone(),
        })
    }

    /// Insert a notification at the head.
    ///
    /// Rejects contradictory lifecycle configuration before mutating
    /// anything. A duplicate live id is dropped, not replaced; replacing
    /// would resurrect a stale auto-hide timer. Capacity eviction and the
    /// auto-hide timer are handled here; side effects are the dispatcher's
    /// concern and run only for [`EnqueueOutcome::Inserted`].
    pub fn enqueue(&self, notification: Notification) -> AppResult<EnqueueOutcome> {
        let delay = notification.auto_hide_delay()?;
        let id = notification.id;

        let evicted: Vec<NotificationId> = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

            if entries.iter().any(|n| n.id == id) {
                debug!(%id, "duplicate notification id, emission dropped");
                EngineMetrics::inc(&self.metrics.notifications_deduplicated);
                return Ok(EnqueueOutcome::Deduplicated);
            }

            entries.push_front(notification);
            self.evict_over_capacity(&mut entries)
        };

        for old in &evicted {
            self.scheduler.cancel(&timer_key(*old));
        }

        if let Some(delay) = delay {
            let weak = self.weak_self.clone();
            self.scheduler.schedule(timer_key(id), delay, async move {
                if let Some(queue) = weak.upgrade() {
                    queue.auto_hide(id).await;
                }
            });
        }

        EngineMetrics::inc(&self.metrics.notifications_enqueued);
        Ok(EnqueueOutcome::Inserted)
    }

    /// Remove an entry and cancel its pending auto-hide timer. Removing an
    /// absent id is a no-op, not an error. Returns whether an entry was
    /// removed.
    pub fn remove(&self, id: NotificationId) -> bool {
        self.scheduler.cancel(&timer_key(id));
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() < before
    }

    /// Mark an entry as read. Does not remove it or touch its timer.
    /// Returns whether the entry existed.
    pub fn mark_read(&self, id: NotificationId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.read = true;
                true
            }
            None => false,
        }
    }

    /// Update the progress of a long-running notification in place.
    /// Returns whether the entry existed.
    pub fn update_progress(&self, id: NotificationId, progress: NotificationProgress) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.progress = Some(progress);
                true
            }
            None => false,
        }
    }

    /// Remove every entry and cancel all pending auto-hide timers.
    pub fn clear_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        drop(entries);
        self.scheduler.cancel_prefix("notify:");
    }

    /// The most recent `max_count` entries, presented in insertion order
    /// (oldest of the selection first). Read state is not filtered.
    pub fn visible(&self, max_count: usize) -> Vec<Notification> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut selected: Vec<Notification> = entries.iter().take(max_count).cloned().collect();
        selected.reverse();
        selected
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of unread live entries (badge counters).
    pub fn unread_count(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().filter(|n| n.is_unread()).count()
    }

    /// Auto-hide expiry path. The timer was already consumed, so a
    /// preceding explicit `remove` makes this a no-op and no second
    /// removal event fires.
    async fn auto_hide(&self, id: NotificationId) {
        let removed = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            let before = entries.len();
            entries.retain(|n| n.id != id);
            entries.len() < before
        };

        if !removed {
            return;
        }

        EngineMetrics::inc(&self.metrics.notifications_auto_hidden);
        let payload = HiddenPayload { notification_id: id };
        self.bus
            .publish(
                topics::NOTIFICATION_HIDDEN,
                serde_json::to_value(payload).unwrap_or_default(),
            )
            .await;
    }

    /// Trim to `2 × max_visible`, oldest-first, skipping urgent entries.
    /// Returns the ids evicted so their timers can be cancelled.
    fn evict_over_capacity(&self, entries: &mut VecDeque<Notification>) -> Vec<NotificationId> {
        let cap = self.max_visible * 2;
        let mut evicted = Vec::new();

        while entries.len() > cap {
            let victim = entries
                .iter()
                .rposition(|n| n.priority.evictable())
                .map(|idx| entries.remove(idx));
            match victim {
                Some(Some(n)) => {
                    debug!(id = %n.id, "capacity pressure evicted notification");
                    evicted.push(n.id);
                }
                // Only urgent entries left; the bound yields to their
                // explicit-removal guarantee.
                _ => break,
            }
        }

        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_entity::notification::NotificationPriority;
    use std::time::Duration;

    fn queue(max_visible: usize) -> Arc<NotificationQueue> {
        let metrics = Arc::new(EngineMetrics::new());
        let bus = Arc::new(EventBus::new(Arc::clone(&metrics)));
        NotificationQueue::new(Arc::new(Scheduler::new()), bus, metrics, max_visible)
    }

    fn note(priority: NotificationPriority) -> Notification {
        Notification::new("reply", "title", "body").with_priority(priority)
    }

    #[tokio::test(start_paused = true)]
    async fn test_insertion_order_is_preserved() {
        let queue = queue(5);
        let low = note(NotificationPriority::Low);
        let urgent = note(NotificationPriority::Urgent);
        let medium = note(NotificationPriority::Medium);
        let expected = vec![low.id, urgent.id, medium.id];

        for n in [low, urgent, medium] {
            assert_eq!(queue.enqueue(n).unwrap(), EnqueueOutcome::Inserted);
        }

        // Insertion order; priority does not reorder.
        let ids: Vec<_> = queue.visible(10).iter().map(|n| n.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_hide_removes_and_publishes_once() {
        let queue = queue(5);
        let n = note(NotificationPriority::Medium);
        let id = n.id;
        queue.enqueue(n).unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(queue.is_empty());
        assert_eq!(queue.metrics.snapshot().notifications_auto_hidden, 1);

        // The deadline passing again changes nothing.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!queue.remove(id));
        assert_eq!(queue.metrics.snapshot().notifications_auto_hidden, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_before_deadline_suppresses_expiry() {
        let queue = queue(5);
        let n = note(NotificationPriority::Medium);
        let id = n.id;
        queue.enqueue(n).unwrap();

        assert!(queue.remove(id));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(queue.metrics.snapshot().notifications_auto_hidden, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_urgent_never_auto_hides() {
        let queue = queue(5);
        queue.enqueue(note(NotificationPriority::Urgent)).unwrap();

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest_non_urgent() {
        let queue = queue(2); // retention = 4
        let urgent = note(NotificationPriority::Urgent);
        let urgent_id = urgent.id;
        queue.enqueue(urgent).unwrap();

        let mut low_ids = Vec::new();
        for _ in 0..5 {
            let n = note(NotificationPriority::Low);
            low_ids.push(n.id);
            queue.enqueue(n).unwrap();
        }

        let ids: Vec<_> = queue.visible(10).iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), 4);
        // The urgent entry enqueued first survives; the two oldest lows go.
        assert!(ids.contains(&urgent_id));
        assert!(!ids.contains(&low_ids[0]));
        assert!(!ids.contains(&low_ids[1]));
        assert!(ids.contains(&low_ids[3]));
        assert!(ids.contains(&low_ids[4]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_live_id_is_dropped() {
        let queue = queue(5);
        let n = note(NotificationPriority::Medium);
        queue.enqueue(n.clone()).unwrap();
        assert_eq!(queue.enqueue(n).unwrap(), EnqueueOutcome::Deduplicated);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.metrics.snapshot().notifications_deduplicated, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_id_may_be_reemitted() {
        let queue = queue(5);
        let n = note(NotificationPriority::Medium);
        let id = n.id;
        queue.enqueue(n.clone()).unwrap();
        queue.remove(id);
        assert_eq!(queue.enqueue(n).unwrap(), EnqueueOutcome::Inserted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_read_keeps_entry_and_timer() {
        let queue = queue(5);
        let n = note(NotificationPriority::Medium);
        let id = n.id;
        queue.enqueue(n).unwrap();

        assert!(queue.mark_read(id));
        assert_eq!(queue.unread_count(), 0);
        assert_eq!(queue.len(), 1);

        // Auto-hide still fires after the read.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(queue.is_empty());

        assert!(!queue.mark_read(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_progress_in_place() {
        let queue = queue(5);
        let n = note(NotificationPriority::Urgent);
        let id = n.id;
        queue.enqueue(n).unwrap();

        let progress = NotificationProgress {
            current: 3,
            total: 10,
            label: Some("importing".to_string()),
        };
        assert!(queue.update_progress(id, progress.clone()));
        assert_eq!(queue.visible(1)[0].progress.as_ref(), Some(&progress));

        assert!(!queue.update_progress(NotificationId::new(), progress));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_cancels_timers() {
        let queue = queue(5);
        for _ in 0..3 {
            queue.enqueue(note(NotificationPriority::Medium)).unwrap();
        }
        queue.clear_all();
        assert!(queue.is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(queue.metrics.snapshot().notifications_auto_hidden, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_with_override_rejected_without_mutation() {
        let queue = queue(5);
        let mut n = note(NotificationPriority::Medium).persistent();
        n.auto_hide_ms = Some(4000);
        assert!(queue.enqueue(n).is_err());
        assert!(queue.is_empty());
    }
}
