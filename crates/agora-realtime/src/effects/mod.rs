//! Delivery side effects: sound, vibration, system alerts.

pub mod device;
pub mod dispatcher;

pub use device::{FeedbackDevice, NoopFeedback};
pub use dispatcher::EffectsDispatcher;
