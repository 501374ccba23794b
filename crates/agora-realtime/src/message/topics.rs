//! Event topic names.
//!
//! Inbound topics are published by the transport; derived topics are
//! published by the engine itself. Consumers may subscribe to either.

/// An actor joined a room (or re-announced itself).
pub const USER_JOIN: &str = "user:join";
/// An actor explicitly left a room.
pub const USER_LEAVE: &str = "user:leave";
/// Lightweight presence field update.
pub const PRESENCE_UPDATE: &str = "presence:update";
/// An actor started composing.
pub const TYPING_START: &str = "typing:start";
/// An actor stopped composing.
pub const TYPING_STOP: &str = "typing:stop";
/// A new notification arrived.
pub const NOTIFICATION_NEW: &str = "notification:new";
/// A notification was read.
pub const NOTIFICATION_READ: &str = "notification:read";
/// All notifications were cleared.
pub const NOTIFICATION_CLEAR: &str = "notification:clear";
/// The transport connection dropped.
pub const CONNECTION_LOST: &str = "connection:lost";
/// The transport connection came back.
pub const CONNECTION_RESTORED: &str = "connection:restored";

// Derived topics, published by the engine.

/// A typing indicator expired without an explicit stop.
pub const TYPING_EXPIRED: &str = "typing:expired";
/// A notification was removed by its auto-hide timer.
pub const NOTIFICATION_HIDDEN: &str = "notification:hidden";
/// The disconnect grace period lapsed and online actors were demoted.
pub const PRESENCE_OFFLINE_SWEEP: &str = "presence:offline_sweep";
