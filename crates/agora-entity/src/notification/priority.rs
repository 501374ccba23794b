//! Notification priority levels and lifecycle policy.

use serde::{Deserialize, Serialize};

/// Notification priority levels.
///
/// Priority governs auto-hide duration and side-effect eligibility only;
/// it never reorders the queue.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    /// Low priority — background events.
    Low,
    /// Medium priority — standard events.
    #[default]
    Medium,
    /// High priority — important events.
    High,
    /// Urgent priority — requires explicit dismissal.
    Urgent,
}

impl NotificationPriority {
    /// Parse from string, falling back to `Medium`.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Medium,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Default auto-hide delay in milliseconds. Zero means "never".
    pub fn auto_hide_ms(&self) -> u64 {
        match self {
            Self::Low => 3000,
            Self::Medium => 5000,
            Self::High => 8000,
            Self::Urgent => 0,
        }
    }

    /// Whether an audible cue plays for this priority.
    pub fn plays_sound(&self) -> bool {
        !matches!(self, Self::Low)
    }

    /// Whether a vibration pulse fires for this priority.
    pub fn vibrates(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }

    /// Whether capacity pressure may evict this priority from the queue.
    pub fn evictable(&self) -> bool {
        !matches!(self, Self::Urgent)
    }
}
