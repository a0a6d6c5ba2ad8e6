use std::{sync::Arc, time::Duration};
use tokio::{
    sync::broadcast,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use super::registry::EndpointRegistry;

/// Periodically rehabilitates endpoints whose rate-limit cooldown has elapsed.
///
/// The task is started explicitly and stops on the runtime's shutdown broadcast. Tests call
/// [`RateLimitResetScheduler::tick`] directly instead of waiting on the interval.
pub struct RateLimitResetScheduler {
    registry: Arc<EndpointRegistry>,
    reset_interval: Duration,
}

impl RateLimitResetScheduler {
    #[must_use]
    pub fn new(registry: Arc<EndpointRegistry>, reset_interval: Duration) -> Self {
        Self { registry, reset_interval }
    }

    #[must_use]
    pub fn reset_interval(&self) -> Duration {
        self.reset_interval
    }

    /// Runs one reset pass synchronously and returns the number of rehabilitated endpoints.
    pub fn tick(&self) -> usize {
        let rehabilitated = self.registry.reset_tick();
        debug!(rehabilitated = rehabilitated, "rate limit reset tick");
        rehabilitated
    }

    /// Spawns the recurring reset task.
    ///
    /// The first tick fires one interval after start. The task exits when `shutdown_rx`
    /// receives a value or its sender is dropped.
    #[must_use]
    pub fn start_with_shutdown(
        &self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let reset_interval = self.reset_interval;

        info!(interval_secs = reset_interval.as_secs(), "rate limit reset scheduler started");

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + reset_interval, reset_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let rehabilitated = registry.reset_tick();
                        debug!(rehabilitated = rehabilitated, "rate limit reset tick");
                    }
                    _ = shutdown_rx.recv() => {
                        info!("rate limit reset scheduler shutting down");
                        break;
                    }
                }
            }
        })
    }
}
