use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

use crate::{
    config::ConfigError,
    metrics::MetricsCollector,
    types::EndpointConfig,
    upstream::endpoint::{Endpoint, EndpointSnapshot, EndpointState},
};

/// Tuning knobs of the endpoint registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long an endpoint stays excluded after a rate-limit signal.
    pub rate_limit_cooldown: Duration,
    /// Error count at which an endpoint is excluded from selection.
    pub max_error_count: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { rate_limit_cooldown: Duration::from_secs(60), max_error_count: 5 }
    }
}

/// Ranked set of RPC endpoints and their health state.
///
/// Built once at startup and shared by `Arc` between the retry executor and the rate-limit
/// reset scheduler. Endpoint state changes only through [`mark_success`],
/// [`mark_error`], [`reset_tick`] and the global reset performed by [`select_endpoint`].
///
/// [`mark_success`]: EndpointRegistry::mark_success
/// [`mark_error`]: EndpointRegistry::mark_error
/// [`reset_tick`]: EndpointRegistry::reset_tick
/// [`select_endpoint`]: EndpointRegistry::select_endpoint
pub struct EndpointRegistry {
    /// Sorted by priority; ties keep configuration order.
    endpoints: Vec<Arc<Endpoint>>,
    config: RegistryConfig,
    metrics: MetricsCollector,
}

impl EndpointRegistry {
    /// Creates a registry from the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoEndpoints`] if `endpoints` is empty.
    pub fn new(
        endpoints: Vec<EndpointConfig>,
        config: RegistryConfig,
    ) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let mut endpoints: Vec<Arc<Endpoint>> =
            endpoints.into_iter().map(|cfg| Arc::new(Endpoint::new(cfg))).collect();
        endpoints.sort_by_key(|ep| ep.priority());

        tracing::info!(
            endpoints = endpoints.len(),
            cooldown_secs = config.rate_limit_cooldown.as_secs(),
            max_error_count = config.max_error_count,
            "endpoint registry initialized"
        );

        Ok(Self { endpoints, config, metrics: MetricsCollector::new() })
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    #[must_use]
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.iter().find(|ep| ep.name().as_ref() == name).cloned()
    }

    /// Picks the best endpoint that is currently usable.
    ///
    /// Candidates are endpoints outside any rate-limit cooldown and below the error limit,
    /// ranked by `(priority, error_count)`. When no candidate is left every endpoint is reset
    /// and the highest-priority one is returned, so callers never lock themselves out.
    #[must_use]
    pub fn select_endpoint(&self) -> Arc<Endpoint> {
        let now = Instant::now();
        let max_errors = self.config.max_error_count;

        let best = self
            .endpoints
            .iter()
            .filter_map(|ep| ep.selection_key(now, max_errors).map(|key| (key, ep)))
            .min_by_key(|(key, _)| *key)
            .map(|(_, ep)| Arc::clone(ep));

        if let Some(endpoint) = best {
            tracing::trace!(endpoint = %endpoint.name(), "endpoint selected");
            return endpoint;
        }

        tracing::warn!(
            endpoints = self.endpoints.len(),
            "no usable endpoint left, resetting all endpoint state"
        );
        self.global_reset();

        // `new` rejects an empty list and the list is sorted by priority.
        Arc::clone(&self.endpoints[0])
    }

    /// Reports a successful call: forgives one error and lifts any rate limit.
    pub fn mark_success(&self, endpoint: &Endpoint) {
        let error_count = endpoint.record_success();
        self.metrics.record_endpoint_error_count(endpoint.name(), error_count);
        self.metrics.record_endpoint_state(
            endpoint.name(),
            endpoint.state(Instant::now(), self.config.max_error_count),
        );
    }

    /// Reports a failed call. Rate-limit failures additionally start a cooldown.
    pub fn mark_error(&self, endpoint: &Endpoint, is_rate_limit: bool) {
        let now = Instant::now();
        let cooldown = is_rate_limit.then_some(self.config.rate_limit_cooldown);
        let error_count = endpoint.record_error(now, cooldown);

        if is_rate_limit {
            tracing::warn!(
                endpoint = %endpoint.name(),
                error_count = error_count,
                cooldown_secs = self.config.rate_limit_cooldown.as_secs(),
                "endpoint rate limited"
            );
        } else if error_count == self.config.max_error_count {
            tracing::warn!(
                endpoint = %endpoint.name(),
                error_count = error_count,
                "endpoint reached error limit, excluded from selection"
            );
        } else {
            tracing::debug!(
                endpoint = %endpoint.name(),
                error_count = error_count,
                "endpoint error recorded"
            );
        }

        self.metrics.record_endpoint_error_count(endpoint.name(), error_count);
        self.metrics.record_endpoint_state(
            endpoint.name(),
            endpoint.state(now, self.config.max_error_count),
        );
    }

    /// Rehabilitates endpoints whose rate-limit cooldown has elapsed.
    ///
    /// Each rehabilitated endpoint loses its rate-limit flag and one error, not all of them,
    /// so a provider that keeps throttling cannot flap straight back to the top.
    ///
    /// Returns the number of endpoints rehabilitated.
    pub fn reset_tick(&self) -> usize {
        let now = Instant::now();
        let mut rehabilitated = 0;

        for endpoint in &self.endpoints {
            if endpoint.rehabilitate_if_expired(now) {
                rehabilitated += 1;
                let error_count = endpoint.error_count();
                tracing::info!(
                    endpoint = %endpoint.name(),
                    error_count = error_count,
                    "rate limit cooldown elapsed, endpoint rehabilitated"
                );
                self.metrics.record_endpoint_error_count(endpoint.name(), error_count);
                self.metrics.record_endpoint_state(
                    endpoint.name(),
                    endpoint.state(now, self.config.max_error_count),
                );
            }
        }

        if rehabilitated > 0 {
            self.metrics.record_rehabilitated(rehabilitated);
        }
        rehabilitated
    }

    /// Clears error counts and rate limits on every endpoint.
    pub fn global_reset(&self) {
        for endpoint in &self.endpoints {
            endpoint.reset();
            self.metrics.record_endpoint_error_count(endpoint.name(), 0);
            self.metrics.record_endpoint_state(endpoint.name(), EndpointState::Healthy);
        }
        self.metrics.record_global_reset();
    }

    /// Derived state of the named endpoint.
    #[must_use]
    pub fn endpoint_state(&self, name: &str) -> Option<EndpointState> {
        self.get(name).map(|ep| ep.state(Instant::now(), self.config.max_error_count))
    }

    /// Snapshots of all endpoints in priority order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<EndpointSnapshot> {
        let now = Instant::now();
        self.endpoints
            .iter()
            .map(|ep| ep.snapshot(now, self.config.max_error_count))
            .collect()
    }
}
