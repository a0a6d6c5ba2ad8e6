//! Integration tests for endpoint failover.
//!
//! Each provider is its own mockito server, so per-endpoint hit counts tell exactly where
//! every attempt went.

use crate::mock_infrastructure::{position_return, positions_selector, test_config, RpcMockBuilder};
use feeguard_core::{
    config::AppConfig,
    fees::FeeError,
    runtime::FeeguardRuntime,
    upstream::{RetryError, UpstreamError},
};
use serde_json::json;

const NO_PRICE_FEED: &str = "http://127.0.0.1:1";

fn build_runtime(config: AppConfig) -> FeeguardRuntime {
    FeeguardRuntime::builder()
        .with_config(config)
        .disable_rate_limit_scheduler()
        .build()
        .expect("runtime should build")
}

async fn block_number(runtime: &FeeguardRuntime) -> Result<serde_json::Value, RetryError> {
    runtime
        .components()
        .executor()
        .execute_with_retry(|client| async move {
            client.request("eth_blockNumber", json!([])).await
        })
        .await
}

#[tokio::test]
async fn test_rate_limited_endpoint_rotates_to_next() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_rate_limited(1).await;
    let mut secondary = RpcMockBuilder::new().await;
    secondary.mock_block_number(0x1234).await;

    let runtime = build_runtime(test_config(&[primary.url(), secondary.url()], NO_PRICE_FEED));

    let result = block_number(&runtime).await.expect("secondary should answer");
    assert_eq!(result, json!("0x1234"));

    let registry = runtime.registry();
    let rpc0 = registry.get("rpc-0").unwrap();
    assert!(rpc0.is_rate_limited());
    assert_eq!(rpc0.error_count(), 1);
    assert_eq!(registry.get("rpc-1").unwrap().error_count(), 0);

    primary.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_rate_limited_endpoint_skipped_during_cooldown() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_rate_limited(1).await;
    let mut secondary = RpcMockBuilder::new().await;
    secondary.mock_block_number(7).await;

    let runtime = build_runtime(test_config(&[primary.url(), secondary.url()], NO_PRICE_FEED));

    for _ in 0..3 {
        assert_eq!(block_number(&runtime).await.unwrap(), json!("0x7"));
    }

    // Only the first call touched the throttled provider.
    primary.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_server_errors_exhaust_attempts() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_server_error(3).await;
    let mut secondary = RpcMockBuilder::new().await;
    secondary.mock_server_error(0).await;

    let runtime = build_runtime(test_config(&[primary.url(), secondary.url()], NO_PRICE_FEED));

    let result = block_number(&runtime).await;
    match result {
        Err(RetryError::Exhausted { attempts, last_error }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(last_error, UpstreamError::HttpError(500, _)));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }

    // Errors demote by count within the same priority band, they do not rotate.
    let rpc0 = runtime.registry().get("rpc-0").unwrap();
    assert_eq!(rpc0.error_count(), 3);
    assert!(!rpc0.is_rate_limited());

    primary.assert_all().await;
    secondary.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_global_reset_when_every_endpoint_excluded() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_server_error(2).await;
    let mut secondary = RpcMockBuilder::new().await;
    secondary.mock_server_error(1).await;

    let mut config = test_config(&[primary.url(), secondary.url()], NO_PRICE_FEED);
    config.rate_limit.max_error_count = 1;
    let runtime = build_runtime(config);

    let result = block_number(&runtime).await;
    assert!(matches!(result, Err(RetryError::Exhausted { attempts: 3, .. })));

    // Third attempt found nothing usable, reset everything and went back to the primary.
    let registry = runtime.registry();
    assert_eq!(registry.get("rpc-0").unwrap().error_count(), 1);
    assert_eq!(registry.get("rpc-1").unwrap().error_count(), 0);

    primary.assert_all().await;
    secondary.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_revert_is_not_retried() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_call_revert(&positions_selector(), "Invalid token ID", 1).await;
    let mut secondary = RpcMockBuilder::new().await;
    secondary.mock_call(&positions_selector(), &position_return(0, 0, 0), 0).await;

    let runtime = build_runtime(test_config(&[primary.url(), secondary.url()], NO_PRICE_FEED));

    let result = runtime.fee_resolver().get_unclaimed_fees("999999999").await;
    assert!(matches!(result, Err(FeeError::PositionNotFound(id)) if id == "999999999"));

    // The revert came from a healthy endpoint; it is not penalised.
    assert_eq!(runtime.registry().get("rpc-0").unwrap().error_count(), 0);

    primary.assert_all().await;
    secondary.assert_all().await;
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_success_forgives_previous_errors() {
    let mut primary = RpcMockBuilder::new().await;
    primary.mock_block_number(1).await;

    let runtime = build_runtime(test_config(&[primary.url()], NO_PRICE_FEED));
    let registry = runtime.registry();
    let rpc0 = registry.get("rpc-0").unwrap();
    registry.mark_error(&rpc0, false);
    registry.mark_error(&rpc0, false);

    block_number(&runtime).await.unwrap();
    assert_eq!(rpc0.error_count(), 1);

    runtime.shutdown().await;
}
