//! Side-effect dispatch on notification arrival.

use std::sync::Arc;

use tracing::{debug, trace};

use agora_core::config::realtime::EffectsConfig;
use agora_entity::notification::Notification;

use crate::metrics::EngineMetrics;
use crate::monitor::monitor::ConnectionMonitor;

use super::device::FeedbackDevice;

/// Triggers best-effort delivery side effects for enqueued notifications.
///
/// The dispatcher never mutates queue or presence state; by the time it
/// runs, the state change has already committed, and nothing here can roll
/// it back. Every device failure is swallowed.
pub struct EffectsDispatcher {
    /// Host feedback capability.
    device: Arc<dyn FeedbackDevice>,
    /// Connection status source for the suppress-while-disconnected policy.
    monitor: Arc<ConnectionMonitor>,
    /// Effect policy configuration.
    config: EffectsConfig,
    /// Metrics collector.
    metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for EffectsDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectsDispatcher")
            .field("config", &self.config)
            .finish()
    }
}

impl EffectsDispatcher {
    /// Create a new dispatcher.
    pub fn new(
        device: Arc<dyn FeedbackDevice>,
        monitor: Arc<ConnectionMonitor>,
        config: EffectsConfig,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            device,
            monitor,
            config,
            metrics,
        }
    }

    /// Run the side effects for a freshly inserted notification: audible
    /// cue, then vibration, then system alert, each gated by priority
    /// policy and configuration.
    pub async fn on_enqueued(&self, notification: &Notification) {
        if self.config.require_connection && !self.monitor.is_connected() {
            trace!(id = %notification.id, "suppressing effects while disconnected");
            return;
        }

        if self
            .config
            .muted_categories
            .iter()
            .any(|c| c == &notification.category)
        {
            trace!(
                id = %notification.id,
                category = %notification.category,
                "category muted, effects skipped"
            );
            return;
        }

        let priority = notification.priority;

        if self.config.sound_enabled && priority.plays_sound() {
            self.attempt("sound", self.device.play_cue(priority).await);
        }

        if self.config.vibration_enabled && priority.vibrates() {
            self.attempt("vibration", self.device.vibrate(priority).await);
        }

        self.attempt(
            "external alert",
            self.device.request_external_alert(notification).await,
        );
    }

    fn attempt(&self, what: &str, result: agora_core::result::AppResult<()>) {
        match result {
            Ok(()) => EngineMetrics::inc(&self.metrics.effects_delivered),
            Err(e) => {
                // Best-effort by contract: failures never propagate.
                debug!(effect = what, error = %e, "side effect failed");
                EngineMetrics::inc(&self.metrics.effects_failed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::effects::device::NoopFeedback;
    use agora_core::error::AppError;
    use agora_core::result::AppResult;
    use agora_entity::notification::NotificationPriority;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingDevice {
        cues: AtomicU32,
        vibrations: AtomicU32,
        alerts: AtomicU32,
        fail_all: bool,
    }

    #[async_trait]
    impl FeedbackDevice for RecordingDevice {
        async fn play_cue(&self, _priority: NotificationPriority) -> AppResult<()> {
            self.cues.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(AppError::internal("no audio output"));
            }
            Ok(())
        }

        async fn vibrate(&self, _priority: NotificationPriority) -> AppResult<()> {
            self.vibrations.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(AppError::internal("no vibration motor"));
            }
            Ok(())
        }

        async fn request_external_alert(&self, _notification: &Notification) -> AppResult<()> {
            self.alerts.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(AppError::internal("permission denied"));
            }
            Ok(())
        }
    }

    fn dispatcher(
        device: Arc<RecordingDevice>,
        config: EffectsConfig,
        connected: bool,
    ) -> EffectsDispatcher {
        let metrics = Arc::new(EngineMetrics::new());
        let bus = Arc::new(EventBus::new(Arc::clone(&metrics)));
        let monitor = Arc::new(ConnectionMonitor::new(bus));
        if connected {
            monitor.apply_restored();
        }
        EffectsDispatcher::new(device, monitor, config, metrics)
    }

    fn note(priority: NotificationPriority) -> Notification {
        Notification::new("reply", "t", "b").with_priority(priority)
    }

    #[tokio::test]
    async fn test_priority_gates_sound_and_vibration() {
        let device = Arc::new(RecordingDevice::default());
        let d = dispatcher(Arc::clone(&device), EffectsConfig::default(), true);

        d.on_enqueued(&note(NotificationPriority::Low)).await;
        assert_eq!(device.cues.load(Ordering::SeqCst), 0);
        assert_eq!(device.vibrations.load(Ordering::SeqCst), 0);
        assert_eq!(device.alerts.load(Ordering::SeqCst), 1);

        d.on_enqueued(&note(NotificationPriority::Medium)).await;
        assert_eq!(device.cues.load(Ordering::SeqCst), 1);
        assert_eq!(device.vibrations.load(Ordering::SeqCst), 0);

        d.on_enqueued(&note(NotificationPriority::Urgent)).await;
        assert_eq!(device.cues.load(Ordering::SeqCst), 2);
        assert_eq!(device.vibrations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnected_suppresses_everything() {
        let device = Arc::new(RecordingDevice::default());
        let d = dispatcher(Arc::clone(&device), EffectsConfig::default(), false);

        d.on_enqueued(&note(NotificationPriority::Urgent)).await;
        assert_eq!(device.alerts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_muted_category_skips_effects() {
        let device = Arc::new(RecordingDevice::default());
        let config = EffectsConfig {
            muted_categories: vec!["reply".to_string()],
            ..Default::default()
        };
        let d = dispatcher(Arc::clone(&device), config, true);

        d.on_enqueued(&note(NotificationPriority::High)).await;
        assert_eq!(device.alerts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed_and_counted() {
        let device = Arc::new(RecordingDevice {
            fail_all: true,
            ..Default::default()
        });
        let d = dispatcher(Arc::clone(&device), EffectsConfig::default(), true);

        // Must not panic or propagate.
        d.on_enqueued(&note(NotificationPriority::Urgent)).await;
        assert_eq!(d.metrics.snapshot().effects_failed, 3);
        assert_eq!(d.metrics.snapshot().effects_delivered, 0);
    }

    #[tokio::test]
    async fn test_noop_device_counts_as_delivered() {
        let metrics = Arc::new(EngineMetrics::new());
        let bus = Arc::new(EventBus::new(Arc::clone(&metrics)));
        let monitor = Arc::new(ConnectionMonitor::new(bus));
        monitor.apply_restored();
        let d = EffectsDispatcher::new(
            Arc::new(NoopFeedback),
            monitor,
            EffectsConfig::default(),
            metrics,
        );

        d.on_enqueued(&note(NotificationPriority::High)).await;
        assert_eq!(d.metrics.snapshot().effects_delivered, 3);
    }
}
