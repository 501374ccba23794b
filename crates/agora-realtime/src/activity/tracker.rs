//! Per-room activity state tracking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use agora_core::types::id::{ActorId, RoomId};
use agora_entity::presence::{ActivityKind, ActivityState};

/// Tracks what each actor is doing in each room.
///
/// States are created on the first activity event, refreshed on each
/// subsequent one, and dropped by the sweep once they outlive the
/// inactivity window. A missing state reads as [`ActivityKind::Idle`].
#[derive(Debug)]
pub struct ActivityTracker {
    /// Room → actor → activity state.
    rooms: DashMap<RoomId, HashMap<ActorId, ActivityState>>,
    /// Inactivity window after which states are swept.
    window: chrono::Duration,
}

impl ActivityTracker {
    /// Create a new tracker with the given inactivity window.
    pub fn new(window: std::time::Duration) -> Self {
        Self {
            rooms: DashMap::new(),
            window: chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
        }
    }

    /// Record (or refresh) an actor's activity.
    pub fn mark(
        &self,
        room_id: &RoomId,
        actor_id: ActorId,
        kind: ActivityKind,
        context: Option<String>,
    ) {
        let mut room = self.rooms.entry(room_id.clone()).or_default();
        room.insert(
            actor_id,
            ActivityState {
                actor_id,
                kind,
                context,
                updated_at: Utc::now(),
            },
        );
    }

    /// The activity kind an actor currently displays. Absent state reads
    /// as idle.
    pub fn kind_of(&self, room_id: &RoomId, actor_id: ActorId) -> ActivityKind {
        self.rooms
            .get(room_id)
            .and_then(|room| room.get(&actor_id).map(|s| s.kind))
            .unwrap_or(ActivityKind::Idle)
    }

    /// All activity states in a room, unordered.
    pub fn snapshot(&self, room_id: &RoomId) -> Vec<ActivityState> {
        self.rooms
            .get(room_id)
            .map(|room| room.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove an actor's state (on leave / session end).
    pub fn remove_actor(&self, room_id: &RoomId, actor_id: ActorId) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.remove(&actor_id);
        }
        self.drop_room_if_empty(room_id);
    }

    /// Drop every state older than the inactivity window, demoting those
    /// actors' displayed activity to idle. Returns the number of states
    /// dropped.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut swept = 0;
        for mut room in self.rooms.iter_mut() {
            let before = room.len();
            room.retain(|_, state| !state.is_stale(self.window, now));
            swept += before - room.len();
        }
        self.rooms.retain(|_, room| !room.is_empty());

        if swept > 0 {
            debug!(swept, "swept inactive activity states");
        }
        swept
    }

    fn drop_room_if_empty(&self, room_id: &RoomId) {
        self.rooms.remove_if(room_id, |_, room| room.is_empty());
    }
}
