//! Presence record and patch-merge semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_core::types::id::ActorId;

use super::status::PresenceStatus;

/// Device class an actor is connected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Desktop browser or app.
    Desktop,
    /// Mobile browser or app.
    Mobile,
    /// Tablet.
    Tablet,
}

/// Where in the application an actor currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    /// Page identifier (route or slug).
    pub page: String,
    /// Optional section within the page.
    pub section: Option<String>,
}

/// The complete presence state for an actor within one room.
///
/// Exactly one record exists per (room, actor). `last_seen` is
/// monotonically non-decreasing: patches carrying an older timestamp keep
/// the existing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Actor identifier.
    pub actor_id: ActorId,
    /// Current status.
    pub status: PresenceStatus,
    /// Device class.
    pub device: DeviceKind,
    /// Last time the actor was seen, UTC.
    pub last_seen: DateTime<Utc>,
    /// Current location within the application.
    pub location: PageLocation,
}

impl PresenceRecord {
    /// Apply a partial update. Fields present in the patch overwrite the
    /// record; absent fields retain their prior values. `last_seen` only
    /// moves forward.
    pub fn merge(&mut self, patch: &PresencePatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(device) = patch.device {
            self.device = device;
        }
        if let Some(last_seen) = patch.last_seen {
            if last_seen > self.last_seen {
                self.last_seen = last_seen;
            }
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
    }
}

/// A partial presence update. Every field is optional; absent fields leave
/// the target record untouched. Join events carry the same shape so that a
/// re-join acts as a patch rather than a replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePatch {
    /// New status, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PresenceStatus>,
    /// New device class, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceKind>,
    /// New last-seen timestamp, if advancing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// New location, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PageLocation>,
}

impl PresencePatch {
    /// Materialize a fresh record from this patch for a first-time join,
    /// filling absent fields with defaults.
    pub fn into_record(self, actor_id: ActorId, now: DateTime<Utc>) -> PresenceRecord {
        PresenceRecord {
            actor_id,
            status: self.status.unwrap_or(PresenceStatus::Online),
            device: self.device.unwrap_or(DeviceKind::Desktop),
            last_seen: self.last_seen.unwrap_or(now),
            location: self.location.unwrap_or_default(),
        }
    }
}
