//! Notification entity and priority policy.

pub mod model;
pub mod priority;

pub use model::{Notification, NotificationProgress};
pub use priority::NotificationPriority;
