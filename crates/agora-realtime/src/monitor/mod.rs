//! Transport connection monitoring.

pub mod monitor;
pub mod probe;
pub mod status;

pub use monitor::ConnectionMonitor;
pub use probe::LatencyProbe;
pub use status::{ConnectionState, ConnectionStatus};
