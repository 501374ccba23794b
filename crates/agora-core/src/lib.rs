//! # agora-core
//!
//! Core crate for the Agora realtime engine. Contains configuration
//! schemas, typed identifiers, actor identity, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Agora crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
