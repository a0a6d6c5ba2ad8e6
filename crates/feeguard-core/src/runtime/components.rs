//! Core component container for the feeguard runtime.

use std::sync::Arc;

use crate::{
    fees::FeeResolver,
    metrics::MetricsCollector,
    pricing::PriceOracleCache,
    upstream::{EndpointRegistry, HttpClient, RateLimitResetScheduler, RetryExecutor},
};

/// Container for all initialized components.
///
/// Every component is shared through `Arc`; mutable state lives behind the components' own
/// locks, so the container is freely cloneable.
#[derive(Clone)]
pub struct FeeguardComponents {
    metrics_collector: MetricsCollector,
    http_client: Arc<HttpClient>,
    registry: Arc<EndpointRegistry>,
    executor: Arc<RetryExecutor>,
    price_cache: Arc<PriceOracleCache>,
    fee_resolver: Arc<FeeResolver>,
    scheduler: Option<Arc<RateLimitResetScheduler>>,
}

impl FeeguardComponents {
    #[must_use]
    pub(super) fn new(
        metrics_collector: MetricsCollector,
        http_client: Arc<HttpClient>,
        registry: Arc<EndpointRegistry>,
        executor: Arc<RetryExecutor>,
        price_cache: Arc<PriceOracleCache>,
        fee_resolver: Arc<FeeResolver>,
        scheduler: Option<Arc<RateLimitResetScheduler>>,
    ) -> Self {
        Self {
            metrics_collector,
            http_client,
            registry,
            executor,
            price_cache,
            fee_resolver,
            scheduler,
        }
    }

    #[must_use]
    pub fn metrics_collector(&self) -> MetricsCollector {
        self.metrics_collector
    }

    #[must_use]
    pub fn http_client(&self) -> &Arc<HttpClient> {
        &self.http_client
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<RetryExecutor> {
        &self.executor
    }

    #[must_use]
    pub fn price_cache(&self) -> &Arc<PriceOracleCache> {
        &self.price_cache
    }

    #[must_use]
    pub fn fee_resolver(&self) -> &Arc<FeeResolver> {
        &self.fee_resolver
    }

    /// Returns the rate limit reset scheduler, if enabled.
    #[must_use]
    pub fn scheduler(&self) -> Option<&Arc<RateLimitResetScheduler>> {
        self.scheduler.as_ref()
    }

    #[must_use]
    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }
}
