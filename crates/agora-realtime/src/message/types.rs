//! Payload type definitions for the event catalog.
//!
//! Every struct here is the deserialization target of one topic in
//! [`super::topics`]. Required fields double as the malformed-event
//! check: a payload missing one of them fails deserialization and is
//! dropped at the bus boundary. The notification topics reuse the
//! [`agora_entity::notification::Notification`] entity directly.

use serde::{Deserialize, Serialize};

use agora_core::types::id::{ActorId, NotificationId, RoomId};
use agora_entity::presence::PresencePatch;

/// Payload of [`super::topics::USER_JOIN`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPayload {
    /// Room being joined.
    pub room_id: RoomId,
    /// Joining actor.
    pub actor_id: ActorId,
    /// Initial presence fields. Partial: a re-join patches the existing
    /// record rather than replacing it.
    #[serde(default)]
    pub record: PresencePatch,
}

/// Payload of [`super::topics::USER_LEAVE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeavePayload {
    /// Room being left.
    pub room_id: RoomId,
    /// Leaving actor.
    pub actor_id: ActorId,
}

/// Payload of [`super::topics::PRESENCE_UPDATE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// Room scope.
    pub room_id: RoomId,
    /// Actor being updated.
    pub actor_id: ActorId,
    /// Fields to merge.
    pub patch: PresencePatch,
}

/// Payload of [`super::topics::TYPING_START`] and
/// [`super::topics::TYPING_STOP`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingPayload {
    /// Room scope.
    pub room_id: RoomId,
    /// Composing actor.
    pub actor_id: ActorId,
    /// Display name for typing summaries.
    pub actor_name: String,
}

/// Payload of [`super::topics::TYPING_EXPIRED`], published by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingExpiredPayload {
    /// Room scope.
    pub room_id: RoomId,
    /// Actor whose indicator lapsed.
    pub actor_id: ActorId,
}

/// Payload of [`super::topics::NOTIFICATION_READ`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadPayload {
    /// Notification being marked read.
    pub notification_id: NotificationId,
}

/// Payload of [`super::topics::NOTIFICATION_HIDDEN`], published by the
/// engine when an auto-hide timer fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenPayload {
    /// Notification that was removed.
    pub notification_id: NotificationId,
}
