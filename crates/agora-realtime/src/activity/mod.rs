//! Ephemeral activity and typing indicators.

pub mod tracker;
pub mod typing;

pub use tracker::ActivityTracker;
pub use typing::{TypingTracker, typing_summary};
