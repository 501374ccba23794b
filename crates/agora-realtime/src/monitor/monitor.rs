//! Connection monitor — tracks transport up/down state and latency.
//!
//! The transport reports lifecycle changes through [`ConnectionMonitor::transport_up`]
//! and [`ConnectionMonitor::transport_down`], which publish the
//! `connection:restored` / `connection:lost` events; the monitor's own bus
//! subscription then applies the state change. Keeping the state change on
//! the dispatch path means every consumer observes transitions in the same
//! order as the rest of the event stream.

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::bus::EventBus;

use super::status::{ConnectionState, ConnectionStatus};

/// Tracks transport lifecycle and round-trip latency.
pub struct ConnectionMonitor {
    /// Current lifecycle state.
    state: RwLock<ConnectionState>,
    /// Last sampled round-trip latency in milliseconds.
    latency_ms: AtomicU64,
    /// Bus for lifecycle events.
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for ConnectionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionMonitor")
            .field("state", &self.state())
            .finish()
    }
}

impl ConnectionMonitor {
    /// Create a new monitor in the disconnected state.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            latency_ms: AtomicU64::new(0),
            bus,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the transport is currently up.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Point-in-time status for consumers gating side effects.
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.is_connected(),
            latency_ms: self.latency_ms.load(Ordering::Relaxed),
        }
    }

    /// Record a latency sample from the probe loop.
    pub fn record_latency(&self, latency_ms: u64) {
        self.latency_ms.store(latency_ms, Ordering::Relaxed);
    }

    /// The transport started a connection attempt. This transition has no
    /// catalog event; consumers only care about lost/restored.
    pub fn transport_connecting(&self) {
        self.set_state(ConnectionState::Connecting);
    }

    /// The transport came up. Publishes `connection:restored`; the state
    /// change itself lands when the event is dispatched.
    pub async fn transport_up(&self) {
        self.bus
            .publish(crate::message::topics::CONNECTION_RESTORED, serde_json::json!({}))
            .await;
    }

    /// The transport dropped. Publishes `connection:lost`.
    pub async fn transport_down(&self) {
        self.bus
            .publish(crate::message::topics::CONNECTION_LOST, serde_json::json!({}))
            .await;
    }

    /// Apply a `connection:restored` event. Called from the engine's bus
    /// subscription.
    pub fn apply_restored(&self) {
        self.set_state(ConnectionState::Connected);
    }

    /// Apply a `connection:lost` event. Called from the engine's bus
    /// subscription.
    pub fn apply_lost(&self) {
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state != next {
            info!(from = state.as_str(), to = next.as_str(), "connection state changed");
            *state = next;
        }
    }
}
