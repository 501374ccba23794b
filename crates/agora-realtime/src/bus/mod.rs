//! Typed publish/subscribe event bus.

pub mod bus;

pub use bus::{EventBus, EventPayload, SubscriptionToken};
