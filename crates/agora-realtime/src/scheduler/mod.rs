//! Keyed one-shot timer scheduling.
//!
//! Every timer in the engine (typing TTL, notification auto-hide, the
//! disconnect grace period) goes through [`Scheduler`] so that re-arming a
//! key is mechanically "cancel old, arm new". A key has at most one live
//! timer; arming an already-armed key replaces the previous timer without
//! firing it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::trace;

/// A live timer registration.
#[derive(Debug)]
struct TimerEntry {
    /// Monotonic arm counter; a woken task only fires if its generation is
    /// still the one registered under the key.
    generation: u64,
    /// Spawned sleep task. `None` briefly during arming.
    handle: Option<JoinHandle<()>>,
}

/// Keyed one-shot timers on top of the tokio runtime.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: Arc<DashMap<String, TimerEntry>>,
    next_generation: AtomicU64,
}

impl Scheduler {
    /// Create a new scheduler with no armed timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer under `key` to run `callback` after
    /// `delay`. Any previous timer under the same key is cancelled first
    /// and will never fire.
    pub fn schedule<F>(&self, key: impl Into<String>, delay: Duration, callback: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        if let Some((_, old)) = self.timers.remove(&key) {
            if let Some(handle) = old.handle {
                handle.abort();
            }
            trace!(key = %key, "re-armed timer, previous instance cancelled");
        }

        self.timers.insert(
            key.clone(),
            TimerEntry {
                generation,
                handle: None,
            },
        );

        let timers = Arc::clone(&self.timers);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // A cancel or re-arm between wake-up and here must win.
            let current = timers.get(&task_key).map(|e| e.generation);
            if current != Some(generation) {
                return;
            }

            callback.await;

            timers.remove_if(&task_key, |_, e| e.generation == generation);
        });

        if let Some(mut entry) = self.timers.get_mut(&key) {
            if entry.generation == generation {
                entry.handle = Some(handle);
            } else {
                // A newer arm replaced us while spawning; abort is a no-op
                // if the task already returned.
                handle.abort();
            }
        }
    }

    /// Cancel the timer under `key`. Returns whether a timer was armed.
    pub fn cancel(&self, key: &str) -> bool {
        match self.timers.remove(key) {
            Some((_, entry)) => {
                if let Some(handle) = entry.handle {
                    handle.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Cancel every timer whose key starts with `prefix`. Returns the
    /// number of timers cancelled. Used at teardown to drop all timers
    /// belonging to one room or one queue at once.
    pub fn cancel_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .timers
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();

        keys.iter().filter(|k| self.cancel(k)).count()
    }

    /// Cancel every armed timer.
    pub fn cancel_all(&self) {
        let keys: Vec<String> = self.timers.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            self.cancel(&key);
        }
    }

    /// Number of currently armed timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timers are armed.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
