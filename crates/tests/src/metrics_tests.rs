//! Prometheus rendering of metrics recorded by a live runtime.

use crate::mock_infrastructure::{test_config, RpcMockBuilder};
use feeguard_core::{metrics::init_prometheus_recorder, runtime::FeeguardRuntime};
use serde_json::json;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_attempt_metrics_rendered() {
    let handle = init_prometheus_recorder();

    let mut primary = RpcMockBuilder::new().await;
    primary.mock_rate_limited(1).await;
    let mut secondary = RpcMockBuilder::new().await;
    secondary.mock_block_number(1).await;

    let runtime = FeeguardRuntime::builder()
        .with_config(test_config(&[primary.url(), secondary.url()], "http://127.0.0.1:1"))
        .build()
        .unwrap();

    runtime
        .components()
        .executor()
        .execute_with_retry(|client| async move {
            client.request("eth_blockNumber", json!([])).await
        })
        .await
        .unwrap();

    let rendered = handle.render();
    assert!(rendered.contains("feeguard_rpc_attempts_total"));
    assert!(rendered.contains("rpc-1"));
    assert!(rendered.contains("rate_limit"));

    runtime.shutdown().await;
}
