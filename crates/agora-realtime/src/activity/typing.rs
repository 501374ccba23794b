//! Typing indicators with TTL expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tracing::trace;

use agora_core::types::id::{ActorId, RoomId};

use crate::bus::EventBus;
use crate::message::topics;
use crate::message::types::TypingExpiredPayload;
use crate::metrics::EngineMetrics;
use crate::scheduler::Scheduler;

/// One typing entry: the display name plus the generation of the timer
/// currently armed for it.
#[derive(Debug, Clone)]
struct TypingEntry {
    actor_id: ActorId,
    name: String,
    generation: u64,
}

/// Per-room set of actors currently flagged as typing.
///
/// An entry is added on `typing:start` and removed on `typing:stop` or
/// after the hard TTL, whichever comes first. Re-marking refreshes the TTL
/// by replacing the timer, never stacking a second one. Expiry is
/// generation-checked: a timer that lost a race with a refresh removes
/// nothing.
pub struct TypingTracker {
    /// Room → typing entries in insertion order.
    rooms: DashMap<RoomId, Vec<TypingEntry>>,
    /// Timer source for TTL expiry.
    scheduler: Arc<Scheduler>,
    /// Bus for `typing:expired` events.
    bus: Arc<EventBus>,
    /// Metrics collector.
    metrics: Arc<EngineMetrics>,
    /// Hard TTL for unrefreshed indicators.
    ttl: Duration,
    /// Generation source.
    next_generation: AtomicU64,
    /// Self-handle for timer callbacks.
    weak_self: Weak<TypingTracker>,
}

impl std::fmt::Debug for TypingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingTracker").field("ttl", &self.ttl).finish()
    }
}

fn timer_key(room_id: &RoomId, actor_id: ActorId) -> String {
    format!("typing:{room_id}:{actor_id}")
}

impl TypingTracker {
    /// Create a new tracker.
    pub fn new(
        scheduler: Arc<Scheduler>,
        bus: Arc<EventBus>,
        metrics: Arc<EngineMetrics>,
        ttl: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            rooms: DashMap::new(),
            scheduler,
            bus,
            metrics,
            ttl,
            next_generation: AtomicU64::new(1),
            weak_self: weak_self.clone(),
        })
    }

    /// Flag an actor as typing, refreshing the TTL if already flagged.
    /// Insertion order is preserved across refreshes so summaries stay
    /// stable.
    pub fn mark(&self, room_id: &RoomId, actor_id: ActorId, name: &str) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        {
            let mut room = self.rooms.entry(room_id.clone()).or_default();
            match room.iter_mut().find(|e| e.actor_id == actor_id) {
                Some(entry) => {
                    entry.name = name.to_string();
                    entry.generation = generation;
                }
                None => room.push(TypingEntry {
                    actor_id,
                    name: name.to_string(),
                    generation,
                }),
            }
        }

        EngineMetrics::inc(&self.metrics.typing_marks);

        let weak = self.weak_self.clone();
        let room = room_id.clone();
        self.scheduler
            .schedule(timer_key(room_id, actor_id), self.ttl, async move {
                if let Some(tracker) = weak.upgrade() {
                    tracker.expire(room, actor_id, generation).await;
                }
            });
    }

    /// Remove an actor's typing flag and cancel its timer. Idempotent.
    pub fn stop(&self, room_id: &RoomId, actor_id: ActorId) {
        self.scheduler.cancel(&timer_key(room_id, actor_id));
        self.remove_entry(room_id, actor_id, None);
    }

    /// Actors currently typing in a room, in insertion order.
    pub fn typing_in(&self, room_id: &RoomId) -> Vec<ActorId> {
        self.rooms
            .get(room_id)
            .map(|room| room.iter().map(|e| e.actor_id).collect())
            .unwrap_or_default()
    }

    /// Display names of actors currently typing, in insertion order.
    pub fn names_in(&self, room_id: &RoomId) -> Vec<String> {
        self.rooms
            .get(room_id)
            .map(|room| room.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Human-readable summary of who is typing in a room, or `None` when
    /// nobody is.
    pub fn summary(&self, room_id: &RoomId) -> Option<String> {
        typing_summary(&self.names_in(room_id))
    }

    /// Drop all indicators for a room and cancel their timers (room
    /// teardown).
    pub fn clear_room(&self, room_id: &RoomId) {
        self.scheduler.cancel_prefix(&format!("typing:{room_id}:"));
        self.rooms.remove(room_id);
    }

    /// TTL expiry path. Removes the entry only if `generation` still
    /// matches — a refresh racing this callback wins — and publishes
    /// `typing:expired` for consumers.
    async fn expire(&self, room_id: RoomId, actor_id: ActorId, generation: u64) {
        if !self.remove_entry(&room_id, actor_id, Some(generation)) {
            trace!(room = %room_id, actor = %actor_id, "typing timer lost race with refresh");
            return;
        }

        EngineMetrics::inc(&self.metrics.typing_expirations);
        let payload = TypingExpiredPayload { room_id, actor_id };
        self.bus
            .publish(
                topics::TYPING_EXPIRED,
                serde_json::to_value(payload).unwrap_or_default(),
            )
            .await;
    }

    fn remove_entry(&self, room_id: &RoomId, actor_id: ActorId, generation: Option<u64>) -> bool {
        let removed = match self.rooms.get_mut(room_id) {
            Some(mut room) => {
                let before = room.len();
                room.retain(|e| {
                    e.actor_id != actor_id
                        || generation.is_some_and(|generation| e.generation != generation)
                });
                room.len() < before
            }
            None => false,
        };
        self.rooms.remove_if(room_id, |_, room| room.is_empty());
        removed
    }
}

/// Derived text for "N people typing" consumers.
///
/// One name renders as `"X is typing"`, two as `"X and Y are typing"`,
/// three or more as `"X and N-1 others are typing"`.
pub fn typing_summary(names: &[String]) -> Option<String> {
    match names {
        [] => None,
        [one] => Some(format!("{one} is typing")),
        [one, two] => Some(format!("{one} and {two} are typing")),
        [first, rest @ ..] => Some(format!("{first} and {} others are typing", rest.len())),
    }
}
