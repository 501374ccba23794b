//! Connection state definitions.

use serde::{Deserialize, Serialize};

/// Transport lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport connection.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The transport is up.
    Connected,
}

impl ConnectionState {
    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Point-in-time connection status consumed by the other components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Whether the transport is currently up.
    pub connected: bool,
    /// Last sampled round-trip latency in milliseconds.
    pub latency_ms: u64,
}
