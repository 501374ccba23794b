//! Presence store — per-room actor records with merge-on-update semantics.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use agora_core::types::id::{ActorId, RoomId};
use agora_entity::presence::{PresencePatch, PresenceRecord, PresenceStatus};

/// One actor's entry within a room, with its insertion sequence for
/// order-stable sorting.
#[derive(Debug, Clone)]
struct PresenceEntry {
    record: PresenceRecord,
    seq: u64,
}

/// Presence state for one room.
#[derive(Debug, Default)]
struct RoomPresence {
    entries: HashMap<ActorId, PresenceEntry>,
    next_seq: u64,
}

/// Tracks presence records for all rooms.
///
/// Rooms are not pre-declared; applying an update for an unknown room
/// creates it. Every mutation funnels through the bus dispatch path, so
/// per-room state never sees interleaved updates for one event stream.
#[derive(Debug)]
pub struct PresenceStore {
    /// Room → presence map.
    rooms: DashMap<RoomId, RoomPresence>,
    /// How long offline records are retained before eviction.
    retention: Duration,
}

impl PresenceStore {
    /// Create a new store with the given offline retention window.
    pub fn new(retention: Duration) -> Self {
        Self {
            rooms: DashMap::new(),
            retention,
        }
    }

    /// Insert or patch an actor's record on join.
    ///
    /// Fields present in `record` overwrite the existing record; absent
    /// fields retain their prior values. A first join materializes the
    /// record with defaults for absent fields.
    pub fn apply_join(&self, room_id: &RoomId, actor_id: ActorId, record: PresencePatch) {
        self.upsert(room_id, actor_id, record);
    }

    /// Merge a lightweight presence patch. Same merge rule as join; an
    /// unknown actor is created, matching join semantics.
    pub fn apply_update(&self, room_id: &RoomId, actor_id: ActorId, patch: PresencePatch) {
        self.upsert(room_id, actor_id, patch);
    }

    /// Remove an actor's record immediately. Explicit leave is
    /// authoritative and bypasses any grace period. Returns whether a
    /// record existed.
    pub fn apply_leave(&self, room_id: &RoomId, actor_id: ActorId) -> bool {
        let removed = match self.rooms.get_mut(room_id) {
            Some(mut room) => room.entries.remove(&actor_id).is_some(),
            None => false,
        };
        self.drop_room_if_empty(room_id);
        removed
    }

    /// Deterministically ordered roster for a room: status priority
    /// descending, then most recent `last_seen` descending, then insertion
    /// order. Equal keys keep their insertion order, so repeated views of
    /// unchanged state are identical.
    pub fn view(&self, room_id: &RoomId) -> Vec<PresenceRecord> {
        let room = match self.rooms.get(room_id) {
            Some(room) => room,
            None => return Vec::new(),
        };

        let mut entries: Vec<&PresenceEntry> = room.entries.values().collect();
        entries.sort_by(|a, b| {
            b.record
                .status
                .priority()
                .cmp(&a.record.status.priority())
                .then(b.record.last_seen.cmp(&a.record.last_seen))
                .then(a.seq.cmp(&b.seq))
        });

        entries.into_iter().map(|e| e.record.clone()).collect()
    }

    /// Evict offline records whose `last_seen` exceeds the retention
    /// window. Returns the number of records evicted.
    pub fn evict_stale(&self, room_id: &RoomId, now: DateTime<Utc>) -> usize {
        let cutoff = match chrono::Duration::from_std(self.retention) {
            Ok(retention) => now - retention,
            Err(_) => return 0,
        };

        let evicted = match self.rooms.get_mut(room_id) {
            Some(mut room) => {
                let before = room.entries.len();
                room.entries.retain(|_, e| {
                    e.record.status != PresenceStatus::Offline || e.record.last_seen >= cutoff
                });
                before - room.entries.len()
            }
            None => 0,
        };

        if evicted > 0 {
            debug!(room = %room_id, evicted, "evicted stale presence records");
        }
        self.drop_room_if_empty(room_id);
        evicted
    }

    /// Run [`Self::evict_stale`] across every room. Returns the total
    /// number of records evicted.
    pub fn evict_stale_all(&self, now: DateTime<Utc>) -> usize {
        let rooms: Vec<RoomId> = self.rooms.iter().map(|r| r.key().clone()).collect();
        rooms.iter().map(|room| self.evict_stale(room, now)).sum()
    }

    /// Demote every online actor to offline, across all rooms. Called when
    /// the disconnect grace period lapses. `last_seen` is left untouched
    /// so retention eviction still measures real activity. Returns the
    /// number of records demoted.
    pub fn demote_online(&self) -> usize {
        let mut demoted = 0;
        for mut room in self.rooms.iter_mut() {
            for entry in room.entries.values_mut() {
                if entry.record.status == PresenceStatus::Online {
                    entry.record.status = PresenceStatus::Offline;
                    demoted += 1;
                }
            }
        }
        if demoted > 0 {
            debug!(demoted, "grace period lapsed, online actors demoted to offline");
        }
        demoted
    }

    /// Number of actors tracked in a room.
    pub fn occupant_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map(|r| r.entries.len()).unwrap_or(0)
    }

    /// Number of rooms currently tracked.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drop all state. The host calls this before the transport replays
    /// its snapshot after a reconnect.
    pub fn reset(&self) {
        self.rooms.clear();
    }

    fn upsert(&self, room_id: &RoomId, actor_id: ActorId, patch: PresencePatch) {
        let mut room = self.rooms.entry(room_id.clone()).or_default();

        match room.entries.get_mut(&actor_id) {
            Some(entry) => entry.record.merge(&patch),
            None => {
                let seq = room.next_seq;
                room.next_seq += 1;
                let record = patch.into_record(actor_id, Utc::now());
                room.entries.insert(actor_id, PresenceEntry { record, seq });
            }
        }
    }

    fn drop_room_if_empty(&self, room_id: &RoomId) {
        if let Some(room) = self.rooms.get(room_id) {
            if room.entries.is_empty() {
                drop(room);
                self.rooms.remove_if(room_id, |_, r| r.entries.is_empty());
            }
        }
    }
}
