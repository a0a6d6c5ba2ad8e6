//! Integration tests for unclaimed fee resolution through the full runtime.

use crate::mock_infrastructure::{
    collect_return, collect_selector, owner_of_selector, owner_return, position_return,
    positions_selector, test_config, PriceMockBuilder, RpcMockBuilder, OWNER, USDC, WETH,
};
use feeguard_core::{
    fees::FeeError,
    runtime::FeeguardRuntime,
    types::FeeSource,
    upstream::RetryError,
};

const ONE_ETH: u128 = 1_000_000_000_000_000_000;

fn build_runtime(rpc_urls: &[String], price_url: &str) -> FeeguardRuntime {
    FeeguardRuntime::builder()
        .with_config(test_config(rpc_urls, price_url))
        .disable_rate_limit_scheduler()
        .build()
        .expect("runtime should build")
}

async fn live_prices() -> PriceMockBuilder {
    let mut prices = PriceMockBuilder::new().await;
    prices.mock_price("weth", 2000.0, 1).await;
    prices.mock_price("usd-coin", 1.0, 1).await;
    prices
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("quote should be priced");
    assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
}

#[tokio::test]
async fn test_simulated_collect_quote() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_call(&positions_selector(), &position_return(5_000_000, 10, 20), 1)
        .await
        .mock_call(&owner_of_selector(), &owner_return(OWNER), 1)
        .await
        .mock_call(&collect_selector(), &collect_return(ONE_ETH, 2_500_000), 1)
        .await;
    let prices = live_prices().await;

    let runtime = build_runtime(&[rpc.url()], &prices.url());
    let quote = runtime.fee_resolver().get_unclaimed_fees("12345").await.unwrap();

    assert_eq!(quote.position_id, "12345");
    assert_eq!(quote.token0, WETH.to_checksum(None));
    assert_eq!(quote.token1, USDC.to_checksum(None));
    assert_eq!(quote.token0_raw, "1000000000000000000");
    assert_eq!(quote.token1_raw, "2500000");
    assert_eq!(quote.source_method, FeeSource::Simulate);
    assert_close(quote.usd_value, 2002.5);

    let breakdown = quote.usd_breakdown.unwrap();
    assert!((breakdown.token0_usd - 2000.0).abs() < 1e-6);
    assert!((breakdown.token1_usd - 2.5).abs() < 1e-6);

    rpc.assert_all().await;
    prices.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_collect_revert_falls_back_to_tokens_owed() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_call(&positions_selector(), &position_return(5_000_000, 123_456_789, 987_654_321), 1)
        .await
        .mock_call(&owner_of_selector(), &owner_return(OWNER), 1)
        .await
        .mock_call_revert(&collect_selector(), "Not approved", 1)
        .await;
    let prices = live_prices().await;

    let runtime = build_runtime(&[rpc.url()], &prices.url());
    let quote = runtime.fee_resolver().get_unclaimed_fees("42").await.unwrap();

    assert_eq!(quote.source_method, FeeSource::FallbackRead);
    assert_eq!(quote.token0_raw, "123456789");
    assert_eq!(quote.token1_raw, "987654321");
    assert!(quote.usd_value.is_some());

    rpc.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_empty_position_short_circuits() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_call(&positions_selector(), &position_return(0, 0, 0), 1)
        .await
        .mock_call(&owner_of_selector(), &owner_return(OWNER), 0)
        .await
        .mock_call(&collect_selector(), &collect_return(0, 0), 0)
        .await;
    let mut prices = PriceMockBuilder::new().await;
    prices.mock_price("weth", 2000.0, 0).await;

    let runtime = build_runtime(&[rpc.url()], &prices.url());
    let quote = runtime.fee_resolver().get_unclaimed_fees("7").await.unwrap();

    assert_eq!(quote.source_method, FeeSource::ZeroShortCircuit);
    assert_eq!(quote.token0_raw, "0");
    assert_eq!(quote.token1_raw, "0");
    assert_eq!(quote.usd_value, Some(0.0));

    rpc.assert_all().await;
    prices.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_unknown_position_is_not_found() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_call_revert(&positions_selector(), "Invalid token ID", 1).await;

    let runtime = build_runtime(&[rpc.url()], "http://127.0.0.1:1");
    let result = runtime.fee_resolver().get_unclaimed_fees("999999999").await;

    assert!(matches!(result, Err(FeeError::PositionNotFound(id)) if id == "999999999"));
    rpc.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_invalid_position_id_makes_no_calls() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_server_error(0).await;

    let runtime = build_runtime(&[rpc.url()], "http://127.0.0.1:1");
    for id in ["", "abc", "-1", "0x10"] {
        let result = runtime.fee_resolver().get_unclaimed_fees(id).await;
        assert!(matches!(result, Err(FeeError::InvalidPositionId(_))), "id {id:?}");
    }

    rpc.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_providers_surface_rpc_error() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_server_error(3).await;

    let runtime = build_runtime(&[primary.url()], "http://127.0.0.1:1");
    let result = runtime.fee_resolver().get_unclaimed_fees("1").await;

    assert!(matches!(result, Err(FeeError::Rpc(RetryError::Exhausted { attempts: 3, .. }))));
    primary.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_quote_survives_rate_limited_primary() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_rate_limited(1).await;
    let mut secondary = RpcMockBuilder::new().await;
    secondary
        .mock_call(&positions_selector(), &position_return(1, 0, 0), 1)
        .await
        .mock_call(&owner_of_selector(), &owner_return(OWNER), 1)
        .await
        .mock_call(&collect_selector(), &collect_return(ONE_ETH / 2, 0), 1)
        .await;
    let prices = live_prices().await;

    let runtime = build_runtime(&[primary.url(), secondary.url()], &prices.url());
    let quote = runtime.fee_resolver().get_unclaimed_fees("3").await.unwrap();

    assert_eq!(quote.source_method, FeeSource::Simulate);
    assert_close(quote.usd_value, 1000.0);

    primary.assert_all().await;
    secondary.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_price_feed_outage_uses_fallback_constants() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_call(&positions_selector(), &position_return(1, 0, 0), 1)
        .await
        .mock_call(&owner_of_selector(), &owner_return(OWNER), 1)
        .await
        .mock_call(&collect_selector(), &collect_return(ONE_ETH, 2_500_000), 1)
        .await;
    let mut prices = PriceMockBuilder::new().await;
    prices.mock_unavailable().await;

    let runtime = build_runtime(&[rpc.url()], &prices.url());
    let quote = runtime.fee_resolver().get_unclaimed_fees("5").await.unwrap();

    // WETH falls back to 3000 and USDC to 1.
    assert_close(quote.usd_value, 3002.5);
    rpc.assert_all().await;
    runtime.shutdown().await;
}
