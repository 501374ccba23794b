//! Notification queue and lifecycle scheduling.

pub mod queue;

pub use queue::{EnqueueOutcome, NotificationQueue};
