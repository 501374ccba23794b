//! Actor identity reference.

use serde::{Deserialize, Serialize};

use super::id::ActorId;

/// A connected participant as known to the engine.
///
/// Identity data is owned by the embedding application; the engine only
/// references it and never updates profile fields on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable actor identifier.
    pub id: ActorId,
    /// Display name shown in rosters and typing indicators.
    pub display_name: String,
    /// Opaque reference to the actor's avatar (URL or asset key).
    pub avatar_ref: Option<String>,
}

impl Actor {
    /// Create a new actor reference.
    pub fn new(id: ActorId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_ref: None,
        }
    }
}
