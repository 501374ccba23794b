//! Notification entity model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_core::error::AppError;
use agora_core::types::id::NotificationId;

use super::priority::NotificationPriority;

/// Progress attached to a long-running notification (e.g. an upload or a
/// bulk moderation job).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationProgress {
    /// Units completed so far.
    pub current: u64,
    /// Total units.
    pub total: u64,
    /// Human-readable progress label.
    pub label: Option<String>,
}

/// A notification to be delivered to the local consumer.
///
/// The queue assigns a fresh `id` when the source omits one (the serde
/// default covers payloads arriving over the wire). An id is unique among
/// live queue entries; a removed id only reappears if the source re-emits
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    #[serde(default = "NotificationId::new")]
    pub id: NotificationId,
    /// Notification category (e.g. "reply", "mention", "moderation").
    pub category: String,
    /// Priority level.
    #[serde(default)]
    pub priority: NotificationPriority,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// When the notification was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Whether the notification is exempt from auto-hide.
    #[serde(default)]
    pub persistent: bool,
    /// Whether the consumer has read this notification.
    #[serde(default)]
    pub read: bool,
    /// Opaque reference to an action target (a thread, a message).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_ref: Option<String>,
    /// Progress for long-running work, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<NotificationProgress>,
    /// Per-notification auto-hide override in milliseconds. Zero means "no
    /// automatic removal", matching the urgent default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_hide_ms: Option<u64>,
}

impl Notification {
    /// Create a notification with a fresh id and default lifecycle flags.
    pub fn new(
        category: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            category: category.into(),
            priority: NotificationPriority::default(),
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
            persistent: false,
            read: false,
            action_ref: None,
            progress: None,
            auto_hide_ms: None,
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Mark the notification as persistent (exempt from auto-hide).
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Resolve the effective auto-hide delay.
    ///
    /// The explicit `auto_hide_ms` override wins over the priority table;
    /// zero (and the urgent default) uniformly mean "no automatic removal".
    /// A persistent notification carrying a non-zero override is
    /// contradictory and is rejected rather than guessed at.
    pub fn auto_hide_delay(&self) -> Result<Option<Duration>, AppError> {
        if self.persistent {
            if let Some(ms) = self.auto_hide_ms {
                if ms > 0 {
                    return Err(AppError::configuration(format!(
                        "notification {} is persistent but carries auto_hide_ms={ms}",
                        self.id
                    )));
                }
            }
            return Ok(None);
        }

        let ms = self.auto_hide_ms.unwrap_or_else(|| self.priority.auto_hide_ms());
        if ms == 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_millis(ms)))
        }
    }

    /// Whether the consumer has not read this notification yet.
    pub fn is_unread(&self) -> bool {
        !self.read
    }
}
