//! # Metrics
//!
//! Counters and gauges for endpoint health, retry attempts, fee resolution and price lookups.
//!
//! Recording goes through the `metrics` facade, so it is a no-op until a recorder is
//! installed. The CLI installs a Prometheus exporter when started with `--metrics-port`;
//! tests and embedders can install an in-process recorder with [`init_prometheus_recorder`]
//! and render it on demand.
//!
//! Endpoint names are used as labels. They come from configuration, so cardinality is
//! bounded by the number of configured providers.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::{net::SocketAddr, sync::OnceLock};

use crate::{
    types::FeeSource,
    upstream::{endpoint::EndpointState, errors::FailureKind},
};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder once and returns a handle for rendering.
///
/// If a recorder is already installed (for example by [`install_prometheus_exporter`]), a
/// detached recorder is built instead; its handle renders nothing recorded elsewhere.
pub fn init_prometheus_recorder() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "failed to install prometheus recorder, using a detached one"
                );
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Installs a Prometheus recorder that serves `/metrics` on `0.0.0.0:port`.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or a recorder is already installed.
pub fn install_prometheus_exporter(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}

/// Records domain metrics through the global `metrics` recorder.
///
/// The collector holds no state, so it is cheap to clone into every component.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Record one RPC attempt and its outcome (`success` or a [`FailureKind`] label).
    pub fn record_attempt(&self, endpoint: &str, outcome: &'static str) {
        counter!(
            "feeguard_rpc_attempts_total",
            "endpoint" => endpoint.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    /// Record a failed attempt classified by kind.
    pub fn record_failure(&self, endpoint: &str, kind: FailureKind) {
        self.record_attempt(endpoint, kind.as_str());
        if kind == FailureKind::RateLimit {
            counter!("feeguard_rate_limited_total", "endpoint" => endpoint.to_string())
                .increment(1);
        }
    }

    /// Record the current error count of an endpoint.
    pub fn record_endpoint_error_count(&self, endpoint: &str, error_count: u32) {
        gauge!("feeguard_endpoint_error_count", "endpoint" => endpoint.to_string())
            .set(f64::from(error_count));
    }

    /// Record the derived state of an endpoint as a gauge (0 healthy, 1 degraded,
    /// 2 rate limited, 3 unusable).
    pub fn record_endpoint_state(&self, endpoint: &str, state: EndpointState) {
        let value = match state {
            EndpointState::Healthy => 0.0,
            EndpointState::Degraded => 1.0,
            EndpointState::RateLimited => 2.0,
            EndpointState::Unusable => 3.0,
        };
        gauge!("feeguard_endpoint_state", "endpoint" => endpoint.to_string()).set(value);
    }

    /// Record a global reset of the registry.
    pub fn record_global_reset(&self) {
        counter!("feeguard_registry_global_resets_total").increment(1);
    }

    /// Record endpoints rehabilitated by one reset tick.
    pub fn record_rehabilitated(&self, count: usize) {
        counter!("feeguard_endpoints_rehabilitated_total").increment(count as u64);
    }

    /// Record a retry loop that ran out of attempts or time.
    pub fn record_retry_exhausted(&self, reason: &'static str) {
        counter!("feeguard_retry_exhausted_total", "reason" => reason).increment(1);
    }

    /// Record a fee quote by the method that produced it.
    pub fn record_fee_quote(&self, source: FeeSource) {
        counter!("feeguard_fee_quotes_total", "source" => source.as_str()).increment(1);
    }

    /// Record a fee strategy that produced no result.
    pub fn record_fee_strategy_miss(&self, source: FeeSource) {
        counter!("feeguard_fee_strategy_misses_total", "source" => source.as_str()).increment(1);
    }

    /// Record how a price lookup was served: `fresh`, `fetched`, `stale`, `constant` or
    /// `unknown`.
    pub fn record_price_lookup(&self, kind: &'static str) {
        counter!("feeguard_price_lookups_total", "kind" => kind).increment(1);
        if matches!(kind, "stale" | "constant" | "unknown") {
            counter!("feeguard_price_fallback_total", "kind" => kind).increment(1);
        }
    }
}
