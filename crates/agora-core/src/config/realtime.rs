//! Real-time engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time presence and notification engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum notifications shown to a consumer at once. The queue retains
    /// up to twice this many entries.
    #[serde(default = "default_max_visible")]
    pub max_visible_notifications: usize,
    /// Typing indicator time-to-live in milliseconds. A typing flag not
    /// refreshed within this window expires on its own.
    #[serde(default = "default_typing_ttl")]
    pub typing_ttl_ms: u64,
    /// Inactivity window in milliseconds after which an actor's activity
    /// state is dropped (and reads as idle).
    #[serde(default = "default_activity_window")]
    pub activity_inactivity_window_ms: u64,
    /// Interval in milliseconds between activity sweep passes.
    #[serde(default = "default_activity_sweep")]
    pub activity_sweep_interval_ms: u64,
    /// Retention window in milliseconds for offline presence records.
    #[serde(default = "default_presence_retention")]
    pub presence_retention_ms: u64,
    /// Interval in milliseconds between stale-presence sweep passes.
    #[serde(default = "default_presence_sweep")]
    pub presence_sweep_interval_ms: u64,
    /// Grace period in milliseconds after a lost connection before online
    /// actors are demoted to offline.
    #[serde(default = "default_presence_grace")]
    pub presence_grace_ms: u64,
    /// Interval in milliseconds between latency probe round trips.
    #[serde(default = "default_probe_interval")]
    pub latency_probe_interval_ms: u64,
    /// Delivery side-effect settings.
    #[serde(default)]
    pub effects: EffectsConfig,
}

/// Delivery side-effect (sound/vibration/system alert) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectsConfig {
    /// Whether audible cues are enabled.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Whether vibration pulses are enabled.
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    /// Whether side effects are suppressed while disconnected.
    #[serde(default = "default_true")]
    pub require_connection: bool,
    /// Notification categories for which side effects are muted.
    #[serde(default)]
    pub muted_categories: Vec<String>,
}

impl RealtimeConfig {
    /// Typing TTL as a [`Duration`].
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_millis(self.typing_ttl_ms)
    }

    /// Activity inactivity window as a [`Duration`].
    pub fn activity_window(&self) -> Duration {
        Duration::from_millis(self.activity_inactivity_window_ms)
    }

    /// Activity sweep interval as a [`Duration`].
    pub fn activity_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.activity_sweep_interval_ms)
    }

    /// Offline presence retention as a [`Duration`].
    pub fn presence_retention(&self) -> Duration {
        Duration::from_millis(self.presence_retention_ms)
    }

    /// Stale-presence sweep interval as a [`Duration`].
    pub fn presence_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.presence_sweep_interval_ms)
    }

    /// Disconnect grace period as a [`Duration`].
    pub fn presence_grace(&self) -> Duration {
        Duration::from_millis(self.presence_grace_ms)
    }

    /// Latency probe interval as a [`Duration`].
    pub fn latency_probe_interval(&self) -> Duration {
        Duration::from_millis(self.latency_probe_interval_ms)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_visible_notifications: default_max_visible(),
            typing_ttl_ms: default_typing_ttl(),
            activity_inactivity_window_ms: default_activity_window(),
            activity_sweep_interval_ms: default_activity_sweep(),
            presence_retention_ms: default_presence_retention(),
            presence_sweep_interval_ms: default_presence_sweep(),
            presence_grace_ms: default_presence_grace(),
            latency_probe_interval_ms: default_probe_interval(),
            effects: EffectsConfig::default(),
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
            require_connection: true,
            muted_categories: Vec::new(),
        }
    }
}

fn default_max_visible() -> usize {
    5
}

fn default_typing_ttl() -> u64 {
    5000
}

fn default_activity_window() -> u64 {
    60_000
}

fn default_activity_sweep() -> u64 {
    30_000
}

fn default_presence_retention() -> u64 {
    300_000
}

fn default_presence_sweep() -> u64 {
    60_000
}

fn default_presence_grace() -> u64 {
    10_000
}

fn default_probe_interval() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}
