//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `FEEGUARD_CONFIG` env var
//! 3. **Environment variables**: `FEEGUARD__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`UpstreamProvider`]: RPC endpoint definitions with priorities and timeouts
//! - [`RetrySettings`]: attempts, backoff base and overall deadline
//! - [`RateLimitSettings`]: cooldown, rehabilitation interval, exclusion threshold
//! - [`ContractsConfig`]: chain id and position manager address
//! - [`TokenInfo`]: tokens that can be priced
//! - [`PricingConfig`]: price feed, cache TTL and fallback constants
//! - [`HttpSettings`]: outbound HTTP concurrency
//! - [`LoggingConfig`]: Log level and format
//!
//! # Validation
//!
//! [`AppConfig::validate`] runs at startup. Invalid configurations (no endpoints, malformed
//! URLs or addresses, zero intervals) are fatal rather than degrading silently.
//!
//! # Example
//!
//! ```toml
//! [[upstreams.providers]]
//! name = "llama"
//! url = "https://eth.llamarpc.com"
//! priority = 1
//!
//! [rate_limit]
//! cooldown_seconds = 60
//!
//! [contracts]
//! position_manager = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88"
//! ```

use alloy_primitives::Address;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};
use thiserror::Error;
use url::Url;

use crate::{
    pricing::{default_fallback_prices, PriceCacheConfig, TokenInfo, TokenRegistry},
    types::EndpointConfig,
    upstream::{HttpClientConfig, RegistryConfig, RetryPolicy},
};

/// Startup configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no upstream RPC endpoints configured")]
    NoEndpoints,
}

/// Configuration for a single upstream RPC provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamProvider {
    /// Human-readable identifier, used in logs and metrics labels.
    pub name: String,

    /// HTTPS endpoint URL. Often embeds an API key, so it is never logged.
    pub url: String,

    /// Lower is preferred. Defaults to `100`.
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Per-request timeout in seconds. Defaults to `10`.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_priority() -> u32 {
    100
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Container for all upstream RPC provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamsConfig {
    /// Configured providers. Cannot be empty.
    pub providers: Vec<UpstreamProvider>,
}

/// Retry behavior of [`crate::upstream::RetryExecutor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per logical call. Defaults to `3`.
    pub max_attempts: u32,

    /// Backoff before attempt `n + 1` is `base_delay_ms * 2^(n - 1)`. Defaults to `1000`.
    pub base_delay_ms: u64,

    /// Optional deadline for a whole logical call including backoff sleeps.
    pub total_timeout_ms: Option<u64>,
}

/// Rate-limit tracking of the endpoint registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Cooldown applied to an endpoint after a rate-limit signal. Defaults to `60`.
    pub cooldown_seconds: u64,

    /// Interval of the rehabilitation tick. Defaults to `60`.
    pub reset_interval_seconds: u64,

    /// Error count at which an endpoint is excluded from selection. Defaults to `5`.
    pub max_error_count: u32,
}

/// On-chain contract locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Chain the providers serve. Informational, shown by the CLI. Defaults to `1`.
    pub chain_id: u64,

    /// Position manager contract, as hex.
    pub position_manager: String,
}

/// Price feed and cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Base URL of the simple-price feed.
    pub base_url: String,

    /// Freshness window of cached prices. Defaults to `30`.
    pub ttl_seconds: u64,

    /// Timeout of one price request. Defaults to `10`.
    pub request_timeout_seconds: u64,

    /// Symbol to feed id, e.g. `WETH = "weth"`.
    pub feed_ids: HashMap<String, String>,

    /// Symbol to constant price used when no live or cached price exists.
    pub fallback_prices: HashMap<String, f64>,
}

/// Outbound HTTP concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Maximum in-flight requests across all endpoints and the price feed. Defaults to `64`.
    pub concurrent_limit: usize,

    /// How long to wait for a free slot, in milliseconds. Defaults to `2000`.
    pub permit_timeout_ms: u64,
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

/// Root application configuration.
///
/// Loaded with the `FEEGUARD` prefix for environment overrides using `__` as a separator,
/// e.g. `FEEGUARD__RETRY__MAX_ATTEMPTS=5`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upstreams: UpstreamsConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub contracts: ContractsConfig,

    #[serde(default = "default_tokens")]
    pub tokens: Vec<TokenInfo>,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        let provider = |name: &str, url: &str, priority| UpstreamProvider {
            name: name.to_string(),
            url: url.to_string(),
            priority,
            timeout_seconds: default_timeout_seconds(),
        };
        Self {
            providers: vec![
                provider("llama", "https://eth.llamarpc.com", 1),
                provider("publicnode", "https://ethereum-rpc.publicnode.com", 2),
                provider("cloudflare", "https://cloudflare-eth.com", 3),
                provider("ankr", "https://rpc.ankr.com/eth", 4),
            ],
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_ms: 1_000, total_timeout_ms: None }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { cooldown_seconds: 60, reset_interval_seconds: 60, max_error_count: 5 }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            position_manager: "0xC36442b4a4522E871399CD717aBDD847Ab11FE88".to_string(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        let feed_ids = [
            ("ETH", "ethereum"),
            ("WETH", "weth"),
            ("USDC", "usd-coin"),
            ("USDT", "tether"),
            ("DAI", "dai"),
        ]
        .into_iter()
        .map(|(symbol, id)| (symbol.to_string(), id.to_string()))
        .collect();
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            ttl_seconds: 30,
            request_timeout_seconds: 10,
            feed_ids,
            fallback_prices: default_fallback_prices(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpClientConfig::default();
        Self {
            concurrent_limit: defaults.concurrent_limit,
            permit_timeout_ms: defaults.permit_timeout_ms,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

fn default_tokens() -> Vec<TokenInfo> {
    [
        ("WETH", "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 18),
        ("USDC", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
        ("USDT", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6),
        ("DAI", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
    ]
    .into_iter()
    .filter_map(|(symbol, address, decimals)| {
        Some(TokenInfo { symbol: symbol.to_string(), address: address.parse().ok()?, decimals })
    })
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstreams: UpstreamsConfig::default(),
            retry: RetrySettings::default(),
            rate_limit: RateLimitSettings::default(),
            contracts: ContractsConfig::default(),
            tokens: default_tokens(),
            pricing: PricingConfig::default(),
            http: HttpSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// A missing file is not an error; compiled defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("FEEGUARD").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Loads configuration from `config/config.toml`, or from the path in `FEEGUARD_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("FEEGUARD_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoEndpoints`] for an empty provider list, [`ConfigError::Invalid`]
    /// for anything else.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstreams.providers.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let mut names = std::collections::HashSet::new();
        for provider in &self.upstreams.providers {
            if provider.name.is_empty() {
                return Err(invalid("upstream provider with empty name"));
            }
            if !names.insert(provider.name.as_str()) {
                return Err(invalid(format!("duplicate upstream name: {}", provider.name)));
            }
            match Url::parse(&provider.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => return Err(invalid(format!("invalid URL for upstream {}", provider.name))),
            }
            if provider.timeout_seconds == 0 {
                return Err(invalid(format!(
                    "timeout for upstream {} must be greater than 0",
                    provider.name
                )));
            }
        }

        if self.retry.base_delay_ms == 0 {
            return Err(invalid("retry base delay must be greater than 0"));
        }
        if self.retry.total_timeout_ms == Some(0) {
            return Err(invalid("retry total timeout must be greater than 0 when set"));
        }

        if self.rate_limit.cooldown_seconds == 0 {
            return Err(invalid("rate limit cooldown must be greater than 0"));
        }
        if self.rate_limit.reset_interval_seconds == 0 {
            return Err(invalid("rate limit reset interval must be greater than 0"));
        }
        if self.rate_limit.max_error_count == 0 {
            return Err(invalid("max error count must be greater than 0"));
        }

        self.position_manager()?;

        let mut symbols = std::collections::HashSet::new();
        for token in &self.tokens {
            if !symbols.insert(token.symbol.to_uppercase()) {
                return Err(invalid(format!("duplicate token symbol: {}", token.symbol)));
            }
        }

        match Url::parse(&self.pricing.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
            _ => return Err(invalid("invalid pricing base URL")),
        }
        if self.pricing.ttl_seconds == 0 {
            return Err(invalid("price TTL must be greater than 0"));
        }
        if self.pricing.request_timeout_seconds == 0 {
            return Err(invalid("price request timeout must be greater than 0"));
        }
        if let Some((symbol, _)) = self
            .pricing
            .fallback_prices
            .iter()
            .find(|(_, price)| !price.is_finite() || **price < 0.0)
        {
            return Err(invalid(format!("invalid fallback price for {symbol}")));
        }

        if self.http.concurrent_limit == 0 {
            return Err(invalid("HTTP concurrent limit must be greater than 0"));
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err(invalid("logging format must be 'json' or 'pretty'"));
        }

        Ok(())
    }

    /// Converts the providers into registry endpoint configurations.
    #[must_use]
    pub fn endpoint_configs(&self) -> Vec<EndpointConfig> {
        self.upstreams
            .providers
            .iter()
            .map(|p| EndpointConfig {
                name: Arc::from(p.name.as_str()),
                url: p.url.clone(),
                priority: p.priority,
                timeout_seconds: p.timeout_seconds,
            })
            .collect()
    }

    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            rate_limit_cooldown: Duration::from_secs(self.rate_limit.cooldown_seconds),
            max_error_count: self.rate_limit.max_error_count,
        }
    }

    #[must_use]
    pub fn reset_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit.reset_interval_seconds)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            total_timeout: self.retry.total_timeout_ms.map(Duration::from_millis),
        }
    }

    #[must_use]
    pub fn price_cache_config(&self) -> PriceCacheConfig {
        PriceCacheConfig {
            ttl: Duration::from_secs(self.pricing.ttl_seconds),
            fallback_prices: self.pricing.fallback_prices.clone(),
        }
    }

    /// Parses the price feed base URL.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the URL is malformed.
    pub fn pricing_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.pricing.base_url)
            .map_err(|e| invalid(format!("invalid pricing base URL: {e}")))
    }

    #[must_use]
    pub fn price_request_timeout(&self) -> Duration {
        Duration::from_secs(self.pricing.request_timeout_seconds)
    }

    #[must_use]
    pub fn token_registry(&self) -> TokenRegistry {
        TokenRegistry::new(self.tokens.iter().cloned())
    }

    /// Parses the position manager address.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if it is not a 20-byte hex address.
    pub fn position_manager(&self) -> Result<Address, ConfigError> {
        self.contracts
            .position_manager
            .parse()
            .map_err(|e| invalid(format!("invalid position manager address: {e}")))
    }

    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            concurrent_limit: self.http.concurrent_limit,
            permit_timeout_ms: self.http.permit_timeout_ms,
            ..HttpClientConfig::default()
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
