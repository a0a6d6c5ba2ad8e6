//! Integration tests for the price cache against a mock price feed.

use crate::mock_infrastructure::PriceMockBuilder;
use feeguard_core::{
    pricing::{HttpPriceSource, PriceCacheConfig, PriceOracleCache},
    upstream::HttpClient,
};
use std::{collections::HashMap, sync::Arc, time::Duration};

fn cache(base_url: &str, ttl: Duration) -> PriceOracleCache {
    let source = HttpPriceSource::new(
        Arc::new(HttpClient::new().expect("http client")),
        base_url.parse().expect("valid url"),
        HashMap::from([
            ("WETH".to_string(), "weth".to_string()),
            ("USDC".to_string(), "usd-coin".to_string()),
        ]),
        Duration::from_secs(5),
    );
    PriceOracleCache::new(
        Arc::new(source),
        PriceCacheConfig {
            ttl,
            fallback_prices: HashMap::from([("WETH".to_string(), 3000.0)]),
        },
    )
}

#[tokio::test]
async fn test_fresh_price_served_from_cache() {
    let mut feed = PriceMockBuilder::new().await;
    feed.mock_price("weth", 2000.0, 1).await;

    let cache = cache(&feed.url(), Duration::from_secs(30));
    assert_eq!(cache.get_price("WETH").await, 2000.0);
    assert_eq!(cache.get_price("weth").await, 2000.0);

    let entry = cache.cached_entry("WETH").unwrap();
    assert_eq!(entry.symbol, "WETH");
    assert_eq!(entry.price_usd, 2000.0);

    feed.assert_all().await;
}

#[tokio::test]
async fn test_expired_price_is_refetched() {
    let mut feed = PriceMockBuilder::new().await;
    feed.mock_price("weth", 2000.0, 2).await;

    let cache = cache(&feed.url(), Duration::from_millis(50));
    assert_eq!(cache.get_price("WETH").await, 2000.0);
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(cache.get_price("WETH").await, 2000.0);

    feed.assert_all().await;
}

#[tokio::test]
async fn test_stale_price_served_when_feed_fails() {
    let mut feed = PriceMockBuilder::new().await;
    feed.mock_price("weth", 2100.0, 1).await;

    let cache = cache(&feed.url(), Duration::from_millis(50));
    assert_eq!(cache.get_price("WETH").await, 2100.0);

    feed.reset();
    feed.mock_unavailable().await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Last known good price beats the fallback constant.
    assert_eq!(cache.get_price("WETH").await, 2100.0);
}

#[tokio::test]
async fn test_fallback_constant_without_cache() {
    let mut feed = PriceMockBuilder::new().await;
    feed.mock_unavailable().await;

    let cache = cache(&feed.url(), Duration::from_secs(30));
    assert_eq!(cache.get_price("WETH").await, 3000.0);
    assert!(cache.cached_entry("WETH").is_none());
}

#[tokio::test]
async fn test_unknown_symbol_prices_at_zero() {
    let feed = PriceMockBuilder::new().await;

    let cache = cache(&feed.url(), Duration::from_secs(30));
    assert_eq!(cache.get_price("DOGE").await, 0.0);

    // Feed knows USDC but has no mock for it: 501, no cache, no fallback.
    assert_eq!(cache.get_price("USDC").await, 0.0);
}

#[tokio::test]
async fn test_get_prices_batch() {
    let mut feed = PriceMockBuilder::new().await;
    feed.mock_price("weth", 2000.0, 1).await;
    feed.mock_price("usd-coin", 1.0, 1).await;

    let cache = cache(&feed.url(), Duration::from_secs(30));
    let prices = cache.get_prices(&["weth", "USDC", "DOGE"]).await;

    assert_eq!(prices.get("WETH"), Some(&2000.0));
    assert_eq!(prices.get("USDC"), Some(&1.0));
    assert_eq!(prices.get("DOGE"), Some(&0.0));
    feed.assert_all().await;
}
