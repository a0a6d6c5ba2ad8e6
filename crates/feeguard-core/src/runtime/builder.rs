//! Builder for initializing the feeguard runtime with configurable components.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    config::{AppConfig, ConfigError},
    fees::{FeeResolver, PositionReader},
    metrics::MetricsCollector,
    pricing::{HttpPriceSource, PriceOracleCache, PriceSource},
    upstream::{
        EndpointRegistry, HttpClient, HttpTransport, RateLimitResetScheduler, RetryExecutor,
        RpcTransport, UpstreamError,
    },
};

use super::{lifecycle::FeeguardRuntime, FeeguardComponents};

/// Errors that can occur during runtime initialization.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no configuration provided")]
    MissingConfig,

    #[error("configuration validation failed: {0}")]
    Config(#[from] ConfigError),

    #[error("runtime initialization failed: {0}")]
    Initialization(String),
}

impl From<UpstreamError> for RuntimeError {
    fn from(e: UpstreamError) -> Self {
        Self::Initialization(e.to_string())
    }
}

#[derive(Clone)]
struct RuntimeOptions {
    enable_rate_limit_scheduler: bool,
    shutdown_channel_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { enable_rate_limit_scheduler: false, shutdown_channel_capacity: 16 }
    }
}

/// Builder for constructing a [`FeeguardRuntime`].
///
/// The RPC transport and price source default to HTTP implementations built from the
/// configuration; tests and embedders can inject their own.
///
/// # Examples
///
/// ```no_run
/// # use feeguard_core::{config::AppConfig, runtime::FeeguardRuntimeBuilder};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::load()?;
///
/// let runtime = FeeguardRuntimeBuilder::new()
///     .with_config(config)
///     .enable_rate_limit_scheduler()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct FeeguardRuntimeBuilder {
    config: Option<AppConfig>,
    transport: Option<Arc<dyn RpcTransport>>,
    price_source: Option<Arc<dyn PriceSource>>,
    options: RuntimeOptions,
}

impl FeeguardRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            transport: None,
            price_source: None,
            options: RuntimeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Enables the background task that lifts expired rate-limit cooldowns.
    #[must_use]
    pub fn enable_rate_limit_scheduler(mut self) -> Self {
        self.options.enable_rate_limit_scheduler = true;
        self
    }

    #[must_use]
    pub fn disable_rate_limit_scheduler(mut self) -> Self {
        self.options.enable_rate_limit_scheduler = false;
        self
    }

    /// Replaces the HTTP JSON-RPC transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the HTTP price feed.
    #[must_use]
    pub fn with_price_source(mut self, price_source: Arc<dyn PriceSource>) -> Self {
        self.price_source = Some(price_source);
        self
    }

    /// Sets custom shutdown channel capacity (default: 16).
    #[must_use]
    pub fn with_shutdown_channel_capacity(mut self, capacity: usize) -> Self {
        self.options.shutdown_channel_capacity = capacity;
        self
    }

    /// Builds the runtime and starts enabled background tasks.
    ///
    /// Must be called inside a Tokio runtime when the scheduler is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if configuration is missing or invalid, or the HTTP client
    /// cannot be built.
    pub fn build(self) -> Result<FeeguardRuntime, RuntimeError> {
        let config = self.config.ok_or(RuntimeError::MissingConfig)?;
        config.validate()?;

        info!(
            endpoints = config.upstreams.providers.len(),
            chain_id = config.contracts.chain_id,
            scheduler_enabled = self.options.enable_rate_limit_scheduler,
            "initializing feeguard runtime"
        );

        let (shutdown_tx, _) = broadcast::channel::<()>(self.options.shutdown_channel_capacity);
        let metrics = MetricsCollector::new();

        let http_client = Arc::new(HttpClient::with_config(config.http_client_config())?);
        debug!("http client initialized");

        let registry = Arc::new(
            EndpointRegistry::new(config.endpoint_configs(), config.registry_config())?
                .with_metrics(metrics),
        );

        let transport: Arc<dyn RpcTransport> = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new(Arc::clone(&http_client))));
        let executor = Arc::new(
            RetryExecutor::new(Arc::clone(&registry), transport, config.retry_policy())
                .with_metrics(metrics),
        );
        debug!(max_attempts = config.retry.max_attempts, "retry executor initialized");

        let price_source: Arc<dyn PriceSource> = match self.price_source {
            Some(source) => source,
            None => Arc::new(HttpPriceSource::new(
                Arc::clone(&http_client),
                config.pricing_base_url()?,
                config.pricing.feed_ids.clone(),
                config.price_request_timeout(),
            )),
        };
        let price_cache = Arc::new(
            PriceOracleCache::new(price_source, config.price_cache_config()).with_metrics(metrics),
        );
        debug!(ttl_secs = config.pricing.ttl_seconds, "price cache initialized");

        let reader =
            Arc::new(PositionReader::new(Arc::clone(&executor), config.position_manager()?));
        let fee_resolver = Arc::new(
            FeeResolver::new(reader, Arc::clone(&price_cache), config.token_registry())
                .with_metrics(metrics),
        );

        let scheduler = self.options.enable_rate_limit_scheduler.then(|| {
            Arc::new(RateLimitResetScheduler::new(Arc::clone(&registry), config.reset_interval()))
        });

        let components = FeeguardComponents::new(
            metrics,
            http_client,
            registry,
            executor,
            price_cache,
            fee_resolver,
            scheduler,
        );
        let runtime = FeeguardRuntime::new(components, shutdown_tx, config);

        info!("feeguard runtime initialization complete");

        Ok(runtime)
    }
}

impl Default for FeeguardRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
