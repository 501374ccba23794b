//! # agora-realtime
//!
//! Real-time presence and notification delivery engine for Agora.
//! Provides:
//!
//! - Typed publish/subscribe event bus over one transport connection
//! - Connection state and latency monitoring with grace-period eviction
//! - Per-room presence tracking with deterministic roster ordering
//! - Ephemeral typing and activity indicators with TTL expiry
//! - Priority-governed, bounded notification queue with auto-hide
//! - Best-effort delivery side effects (sound, vibration, system alert)
//!
//! The engine is transport-agnostic: the embedding host feeds events into
//! the [`bus::EventBus`] and the engine publishes derived events back onto
//! it. All state is in-memory and rebuilt from the transport's snapshot
//! replay on reconnect.

pub mod activity;
pub mod bus;
pub mod effects;
pub mod engine;
pub mod message;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod presence;
pub mod scheduler;

pub use bus::EventBus;
pub use effects::device::{FeedbackDevice, NoopFeedback};
pub use engine::RealtimeEngine;
pub use monitor::monitor::ConnectionMonitor;
pub use notify::queue::NotificationQueue;
pub use presence::store::PresenceStore;
pub use scheduler::Scheduler;
