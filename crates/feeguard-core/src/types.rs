//! Core type definitions for JSON-RPC, endpoint configuration and fee quotes.
//!
//! # Type Categories
//!
//! ## JSON-RPC Protocol Types
//! - [`JsonRpcRequest`], [`JsonRpcResponse`], [`JsonRpcError`]: wire format of the `eth_call`
//!   reads issued against providers
//!
//! ## Configuration Types
//! - [`EndpointConfig`]: one provider as loaded from configuration
//!
//! ## Results
//! - [`FeeQuote`], [`FeeSource`]: what the fee resolver hands back to its callers

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, sync::Arc};

use crate::pricing::UsdBreakdown;

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Pre-built `Cow` for the version string so requests never allocate for it.
pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed(JSONRPC_VERSION);

/// JSON-RPC 2.0 request structure.
///
/// `id` is echoed back unchanged by the provider.
///
/// # Example
///
/// ```
/// use feeguard_core::types::JsonRpcRequest;
/// use serde_json::json;
///
/// let request = JsonRpcRequest::new("eth_call", Some(json!([])), json!(1));
///
/// assert_eq!(request.method, "eth_call");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    pub params: Option<serde_json::Value>,
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 response structure.
///
/// Carries either a `result` or an `error`, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

impl JsonRpcRequest {
    /// Creates a new JSON-RPC request with zero allocation for the version string.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        params: Option<serde_json::Value>,
        id: serde_json::Value,
    ) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, method: method.into(), params, id }
    }
}

/// JSON-RPC 2.0 error object.
///
/// Providers attach revert data in `data` for failed `eth_call`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Static configuration of one RPC provider.
///
/// # Example
///
/// ```
/// use feeguard_core::types::EndpointConfig;
/// use std::sync::Arc;
///
/// let config = EndpointConfig {
///     name: Arc::from("primary"),
///     url: "https://arb1.arbitrum.io/rpc".to_string(),
///     priority: 1,
///     timeout_seconds: 10,
/// };
///
/// assert_eq!(config.priority, 1);
/// ```
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub name: Arc<str>,
    pub url: String,
    /// Lower is preferred.
    pub priority: u32,
    pub timeout_seconds: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { name: Arc::from(""), url: String::new(), priority: 1, timeout_seconds: 10 }
    }
}

/// Which method produced the raw amounts of a [`FeeQuote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeSource {
    /// Simulated `collect` call, matches what the exchange interface reports.
    Simulate,
    /// Stored `tokensOwed` counters, lags real-time fee growth.
    FallbackRead,
    /// Position has no liquidity and nothing owed; no further calls were made.
    ZeroShortCircuit,
}

impl FeeSource {
    /// Returns a static string representation for metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulate => "simulate",
            Self::FallbackRead => "fallback_read",
            Self::ZeroShortCircuit => "zero_short_circuit",
        }
    }
}

impl std::fmt::Display for FeeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unclaimed fees of one liquidity position.
///
/// Raw amounts are decimal integer strings so callers never lose precision on `uint128`
/// values. `usd_value` is `None` when pricing failed; the raw amounts are still
/// authoritative in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub position_id: String,
    pub token0: String,
    pub token1: String,
    pub token0_raw: String,
    pub token1_raw: String,
    pub usd_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_breakdown: Option<UsdBreakdown>,
    pub source_method: FeeSource,
}
