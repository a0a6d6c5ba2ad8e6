//! Runtime lifecycle management including background tasks and graceful shutdown.

use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    fees::FeeResolver,
    pricing::PriceOracleCache,
    upstream::EndpointRegistry,
};

use super::{builder::FeeguardRuntimeBuilder, FeeguardComponents};

/// Main runtime container owning the components and their background tasks.
///
/// Shutdown is coordinated through a broadcast channel. [`FeeguardRuntime::shutdown`]
/// signals every task, waits for the scheduler to stop, and is safe to call more than once.
pub struct FeeguardRuntime {
    components: FeeguardComponents,
    shutdown_tx: broadcast::Sender<()>,
    config: AppConfig,
    scheduler_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl FeeguardRuntime {
    /// Creates a new builder for constructing a `FeeguardRuntime`.
    #[must_use]
    pub fn builder() -> FeeguardRuntimeBuilder {
        FeeguardRuntimeBuilder::new()
    }

    /// Wraps the initialized components and starts the scheduler if one was configured.
    pub(super) fn new(
        components: FeeguardComponents,
        shutdown_tx: broadcast::Sender<()>,
        config: AppConfig,
    ) -> Self {
        let scheduler_task = components.scheduler().map(|scheduler| {
            let handle = scheduler.start_with_shutdown(shutdown_tx.subscribe());
            debug!("rate limit reset scheduler task started");
            handle
        });

        Self {
            components,
            shutdown_tx,
            config,
            scheduler_task: Mutex::new(scheduler_task),
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn components(&self) -> &FeeguardComponents {
        &self.components
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Convenience accessor for the fee resolver.
    #[must_use]
    pub fn fee_resolver(&self) -> &Arc<FeeResolver> {
        self.components.fee_resolver()
    }

    /// Convenience accessor for the price cache.
    #[must_use]
    pub fn price_cache(&self) -> &Arc<PriceOracleCache> {
        self.components.price_cache()
    }

    /// Convenience accessor for the endpoint registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        self.components.registry()
    }

    /// Creates a new shutdown receiver for custom background tasks.
    #[must_use]
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Signals all background tasks to stop and waits for the scheduler task.
    ///
    /// Calls after the first one log and return immediately.
    pub async fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("shutdown already initiated, ignoring duplicate call");
            return;
        }

        info!("initiating feeguard runtime shutdown");
        if self.shutdown_tx.send(()).is_err() {
            debug!("no background task listening for shutdown");
        }

        let scheduler_task = self.scheduler_task.lock().take();
        if let Some(task) = scheduler_task {
            match task.await {
                Ok(()) => debug!("rate limit reset scheduler task completed"),
                Err(e) if e.is_cancelled() => debug!("rate limit reset scheduler task cancelled"),
                Err(e) => error!(error = %e, "rate limit reset scheduler task failed"),
            }
        }

        info!("feeguard runtime shutdown complete");
    }

    /// Waits for a shutdown signal from any holder of a receiver, then performs cleanup.
    pub async fn wait_for_shutdown(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let _ = shutdown_rx.recv().await;
        info!("shutdown signal received, runtime terminating");
        self.shutdown().await;
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    let _ = assert_send::<FeeguardRuntime>;
    let _ = assert_sync::<FeeguardRuntime>;
};
