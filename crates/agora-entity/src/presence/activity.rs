//! Ephemeral activity state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use agora_core::types::id::ActorId;

/// What an actor is currently doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Reading a page or thread.
    Viewing,
    /// Composing a message.
    Typing,
    /// Editing an existing post.
    Editing,
    /// No recent activity.
    #[default]
    Idle,
    /// Generic recent interaction.
    Active,
}

impl ActivityKind {
    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Viewing => "viewing",
            Self::Typing => "typing",
            Self::Editing => "editing",
            Self::Idle => "idle",
            Self::Active => "active",
        }
    }
}

/// An actor's current activity within a room.
///
/// Created on the first activity event, refreshed on each subsequent one,
/// and swept after the configured inactivity window. A missing state reads
/// as [`ActivityKind::Idle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityState {
    /// Actor identifier.
    pub actor_id: ActorId,
    /// Current activity kind.
    pub kind: ActivityKind,
    /// Optional free-form context (e.g. which draft is being edited).
    pub context: Option<String>,
    /// When the activity was last refreshed, UTC.
    pub updated_at: DateTime<Utc>,
}

impl ActivityState {
    /// Whether this state has outlived the inactivity window.
    pub fn is_stale(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now - self.updated_at > window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_staleness_boundary() {
        let state = ActivityState {
            actor_id: ActorId::new(),
            kind: ActivityKind::Viewing,
            context: None,
            updated_at: Utc.timestamp_opt(0, 0).unwrap(),
        };
        let window = Duration::seconds(60);
        assert!(!state.is_stale(window, Utc.timestamp_opt(60, 0).unwrap()));
        assert!(state.is_stale(window, Utc.timestamp_opt(61, 0).unwrap()));
    }
}
