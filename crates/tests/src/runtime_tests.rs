//! Integration tests for runtime lifecycle and builder components.
//!
//! These tests verify the behavioural contracts of the runtime:
//! - Shutdown is idempotent and reaches every receiver
//! - Builder validation catches configuration errors early
//! - The rate-limit reset scheduler starts only when requested
//!
//! Tests use `tokio::time::timeout` to prevent hanging on failures.

use crate::mock_infrastructure::{test_config, RpcMockBuilder};
use feeguard_core::{
    config::{AppConfig, ConfigError},
    runtime::{FeeguardRuntime, RuntimeError},
};
use serial_test::serial;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::time::{timeout, Duration};

fn config() -> AppConfig {
    test_config(&["http://127.0.0.1:8545".to_string()], "http://127.0.0.1:8080")
}

#[tokio::test]
async fn test_shutdown_reaches_every_receiver() {
    let runtime = FeeguardRuntime::builder()
        .with_config(config())
        .enable_rate_limit_scheduler()
        .build()
        .unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let mut tasks = Vec::new();
    for _ in 0..3 {
        let mut rx = runtime.shutdown_receiver();
        let notified = Arc::clone(&notified);
        tasks.push(tokio::spawn(async move {
            if rx.recv().await.is_ok() {
                notified.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    timeout(Duration::from_secs(5), runtime.shutdown()).await.expect("shutdown should finish");
    for task in tasks {
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    assert_eq!(notified.load(Ordering::SeqCst), 3);
    assert!(runtime.is_shutdown());
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let runtime = FeeguardRuntime::builder()
        .with_config(config())
        .enable_rate_limit_scheduler()
        .build()
        .unwrap();

    runtime.shutdown().await;
    timeout(Duration::from_secs(1), runtime.shutdown())
        .await
        .expect("second shutdown returns immediately");
    assert!(runtime.is_shutdown());
}

#[tokio::test]
async fn test_scheduler_only_when_enabled() {
    let without = FeeguardRuntime::builder().with_config(config()).build().unwrap();
    assert!(!without.components().has_scheduler());

    let with = FeeguardRuntime::builder()
        .with_config(config())
        .enable_rate_limit_scheduler()
        .build()
        .unwrap();
    assert!(with.components().has_scheduler());

    without.shutdown().await;
    with.shutdown().await;
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let mut empty = config();
    empty.upstreams.providers.clear();
    let result = FeeguardRuntime::builder().with_config(empty).build();
    assert!(matches!(result, Err(RuntimeError::Config(ConfigError::NoEndpoints))));

    let mut duplicate = config();
    let provider = duplicate.upstreams.providers[0].clone();
    duplicate.upstreams.providers.push(provider);
    let result = FeeguardRuntime::builder().with_config(duplicate).build();
    assert!(matches!(result, Err(RuntimeError::Config(ConfigError::Invalid(_)))));

    assert!(matches!(FeeguardRuntime::builder().build(), Err(RuntimeError::MissingConfig)));
}

#[tokio::test]
async fn test_registry_follows_configured_priority() {
    let urls = vec![
        "http://127.0.0.1:8001".to_string(),
        "http://127.0.0.1:8002".to_string(),
        "http://127.0.0.1:8003".to_string(),
    ];
    let mut config = test_config(&urls, "http://127.0.0.1:8080");
    config.upstreams.providers[0].priority = 30;

    let runtime = FeeguardRuntime::builder().with_config(config).build().unwrap();
    let names: Vec<String> =
        runtime.registry().snapshots().into_iter().map(|s| s.name.to_string()).collect();
    assert_eq!(names, ["rpc-1", "rpc-2", "rpc-0"]);

    runtime.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_runtime_from_config_file() {
    let mut rpc = RpcMockBuilder::new().await;
    rpc.mock_block_number(0x10).await;

    let path = std::env::temp_dir().join("feeguard_runtime_test.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[[upstreams.providers]]
name = "mock"
url = "{}"
priority = 1

[retry]
base_delay_ms = 10
"#,
            rpc.url()
        ),
    )
    .unwrap();

    let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
    let runtime = FeeguardRuntime::builder().with_config(config).build().unwrap();

    assert_eq!(runtime.registry().len(), 1);
    assert_eq!(runtime.config().retry.base_delay_ms, 10);

    let block = runtime
        .components()
        .executor()
        .execute_with_retry(|client| async move {
            client.request("eth_blockNumber", serde_json::json!([])).await
        })
        .await
        .unwrap();
    assert_eq!(block, serde_json::json!("0x10"));

    runtime.shutdown().await;
    let _ = std::fs::remove_file(&path);
}
