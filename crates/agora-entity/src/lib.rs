//! # agora-entity
//!
//! Domain entity models for the Agora realtime engine. Every struct in
//! this crate is a process-lifetime value object; nothing here touches
//! storage. All entities derive `Debug`, `Clone`, `Serialize`, and
//! `Deserialize` so they can cross the transport unchanged.

pub mod notification;
pub mod presence;
