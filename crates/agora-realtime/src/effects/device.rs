//! Feedback device capability interface.

use async_trait::async_trait;

use agora_core::result::AppResult;
use agora_entity::notification::{Notification, NotificationPriority};

/// Vibration pulse pattern for a priority, as on/off millisecond spans.
/// Urgent gets the longest pattern with the most repetitions.
pub fn vibration_pattern(priority: NotificationPriority) -> &'static [u64] {
    match priority {
        NotificationPriority::Low | NotificationPriority::Medium => &[80],
        NotificationPriority::High => &[120, 60, 120],
        NotificationPriority::Urgent => &[200, 100, 200, 100, 200],
    }
}

/// Host capability for delivery side effects.
///
/// The engine depends only on this interface; whether the host maps it to
/// an audio element and the vibration API or to a desktop notification
/// daemon is its business. Implementations may fail freely: the dispatcher
/// swallows every error.
#[async_trait]
pub trait FeedbackDevice: Send + Sync {
    /// Play an audible cue. Intensity/pitch varies by priority.
    async fn play_cue(&self, priority: NotificationPriority) -> AppResult<()>;

    /// Fire a vibration pulse pattern for the priority.
    async fn vibrate(&self, priority: NotificationPriority) -> AppResult<()>;

    /// Raise a system-level alert, subject to host permission.
    async fn request_external_alert(&self, notification: &Notification) -> AppResult<()>;
}

/// A device that does nothing. Satisfies headless and server hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFeedback;

#[async_trait]
impl FeedbackDevice for NoopFeedback {
    async fn play_cue(&self, _priority: NotificationPriority) -> AppResult<()> {
        Ok(())
    }

    async fn vibrate(&self, _priority: NotificationPriority) -> AppResult<()> {
        Ok(())
    }

    async fn request_external_alert(&self, _notification: &Notification) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgent_pattern_is_longest() {
        let urgent: u64 = vibration_pattern(NotificationPriority::Urgent).iter().sum();
        let high: u64 = vibration_pattern(NotificationPriority::High).iter().sum();
        assert!(urgent > high);
    }
}
