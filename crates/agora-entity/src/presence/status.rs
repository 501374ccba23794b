//! Presence status definitions.

use serde::{Deserialize, Serialize};

/// Actor presence status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// Actor is connected and active.
    Online,
    /// Actor is connected but away.
    Away,
    /// Actor has marked themselves as busy.
    Busy,
    /// Actor is not connected.
    Offline,
}

impl PresenceStatus {
    /// Sort priority for roster views. Higher sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Online => 4,
            Self::Away => 3,
            Self::Busy => 2,
            Self::Offline => 1,
        }
    }

    /// Parses from a string with a default fallback.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "away" => Self::Away,
            "busy" => Self::Busy,
            "offline" => Self::Offline,
            _ => Self::Online,
        }
    }

    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}
