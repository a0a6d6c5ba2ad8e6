use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::time::Instant;

use crate::{metrics::MetricsCollector, pricing::source::PriceSource};

/// Configuration of the price cache.
#[derive(Debug, Clone)]
pub struct PriceCacheConfig {
    /// Age after which a cached price is refreshed.
    pub ttl: Duration,
    /// Static last-resort prices by upper-case symbol, used when a fetch fails and nothing
    /// is cached.
    pub fallback_prices: HashMap<String, f64>,
}

impl Default for PriceCacheConfig {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(30), fallback_prices: default_fallback_prices() }
    }
}

/// Built-in fallback prices. Rough estimates with no freshness guarantee.
#[must_use]
pub fn default_fallback_prices() -> HashMap<String, f64> {
    [("ETH", 3000.0), ("WETH", 3000.0), ("USDC", 1.0), ("USDT", 1.0), ("DAI", 1.0)]
        .into_iter()
        .map(|(symbol, price)| (symbol.to_string(), price))
        .collect()
}

/// Last successfully fetched price of one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct PriceEntry {
    pub symbol: String,
    pub price_usd: f64,
    #[serde(skip)]
    pub fetched_at: Instant,
    /// Wall-clock time of the fetch, for display.
    pub fetched_at_utc: DateTime<Utc>,
}

impl PriceEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Per-symbol USD price cache that never fails.
///
/// Lookup order: fresh cache entry, live fetch, stale cache entry, configured fallback
/// constant, and finally `0.0` for symbols nothing is known about. Entries are overwritten
/// on every successful fetch and never evicted.
///
/// Concurrent misses for the same symbol each fetch; the last successful write wins.
pub struct PriceOracleCache {
    source: Arc<dyn PriceSource>,
    entries: DashMap<String, PriceEntry>,
    config: PriceCacheConfig,
    metrics: MetricsCollector,
}

impl PriceOracleCache {
    #[must_use]
    pub fn new(source: Arc<dyn PriceSource>, config: PriceCacheConfig) -> Self {
        let fallback_prices = config
            .fallback_prices
            .into_iter()
            .map(|(symbol, price)| (symbol.to_uppercase(), price))
            .collect();
        Self {
            source,
            entries: DashMap::new(),
            config: PriceCacheConfig { fallback_prices, ..config },
            metrics: MetricsCollector::new(),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Returns the USD price of `symbol`, degrading instead of failing.
    ///
    /// Symbols nothing is known about price at `0.0`.
    pub async fn get_price(&self, symbol: &str) -> f64 {
        self.price_or_none(symbol).await.unwrap_or(0.0)
    }

    /// Same lookup order as [`get_price`](Self::get_price), but `None` instead of `0.0` when
    /// no fetched, cached or fallback price exists.
    pub async fn price_or_none(&self, symbol: &str) -> Option<f64> {
        let key = symbol.to_uppercase();
        let now = Instant::now();

        // Copy out of the map so no shard guard is held across the fetch.
        let cached = self.entries.get(&key).map(|entry| entry.value().clone());

        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.config.ttl) {
                self.metrics.record_price_lookup("fresh");
                return Some(entry.price_usd);
            }
        }

        match self.source.fetch_usd(&key).await {
            Ok(price) => {
                self.entries.insert(
                    key.clone(),
                    PriceEntry {
                        symbol: key.clone(),
                        price_usd: price,
                        fetched_at: Instant::now(),
                        fetched_at_utc: Utc::now(),
                    },
                );
                self.metrics.record_price_lookup("fetched");
                tracing::debug!(symbol = %key, price_usd = price, "price fetched");
                Some(price)
            }
            Err(e) => self.degraded_price(&key, cached.as_ref(), &e.to_string()),
        }
    }

    fn degraded_price(&self, key: &str, cached: Option<&PriceEntry>, error: &str) -> Option<f64> {
        if let Some(entry) = cached {
            self.metrics.record_price_lookup("stale");
            tracing::warn!(
                symbol = %key,
                price_usd = entry.price_usd,
                age_secs = entry.fetched_at.elapsed().as_secs(),
                error = %error,
                "price fetch failed, serving stale price"
            );
            return Some(entry.price_usd);
        }

        if let Some(price) = self.config.fallback_prices.get(key) {
            self.metrics.record_price_lookup("constant");
            tracing::warn!(
                symbol = %key,
                price_usd = *price,
                error = %error,
                "price fetch failed with nothing cached, serving fallback constant"
            );
            return Some(*price);
        }

        self.metrics.record_price_lookup("unknown");
        tracing::warn!(
            symbol = %key,
            error = %error,
            "price fetch failed for unknown symbol, no price available"
        );
        None
    }

    /// Looks up several symbols concurrently.
    pub async fn get_prices(&self, symbols: &[&str]) -> HashMap<String, f64> {
        let prices = join_all(symbols.iter().map(|symbol| self.get_price(symbol))).await;
        symbols.iter().map(|symbol| symbol.to_uppercase()).zip(prices).collect()
    }

    /// Cached entry for `symbol`, fresh or stale.
    #[must_use]
    pub fn cached_entry(&self, symbol: &str) -> Option<PriceEntry> {
        self.entries.get(&symbol.to_uppercase()).map(|entry| entry.value().clone())
    }

    /// Configured fallback constant for `symbol`.
    #[must_use]
    pub fn fallback_price(&self, symbol: &str) -> Option<f64> {
        self.config.fallback_prices.get(&symbol.to_uppercase()).copied()
    }
}
