//! Round-trip latency probing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time;
use tracing::debug;

use agora_core::result::AppResult;

use super::monitor::ConnectionMonitor;

/// Round-trip probe supplied by the transport.
///
/// The engine never blocks presence or notification processing on a probe;
/// the loop below runs on its own task and stores results through the
/// monitor.
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// Perform one round trip and return its duration.
    async fn round_trip(&self) -> AppResult<Duration>;
}

/// A probe that always reports a fixed latency. Useful for headless hosts
/// and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub Duration);

#[async_trait]
impl LatencyProbe for StaticProbe {
    async fn round_trip(&self) -> AppResult<Duration> {
        Ok(self.0)
    }
}

/// Run the latency probe loop for one monitor.
///
/// Samples while connected; probe failures are logged and the previous
/// sample is kept. Ends when the shutdown channel fires.
pub async fn run_probe_loop(
    monitor: Arc<ConnectionMonitor>,
    probe: Arc<dyn LatencyProbe>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {
                if !monitor.is_connected() {
                    continue;
                }
                match probe.round_trip().await {
                    Ok(rtt) => monitor.record_latency(rtt.as_millis() as u64),
                    Err(e) => debug!(error = %e, "latency probe failed"),
                }
            }
        }
    }

    debug!("latency probe loop ended");
}
