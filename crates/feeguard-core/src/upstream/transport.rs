use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::{
    types::{JsonRpcRequest, JsonRpcResponse},
    upstream::{endpoint::Endpoint, errors::UpstreamError, http_client::HttpClient},
};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Sends one JSON-RPC request to one endpoint.
///
/// The HTTP implementation is [`HttpTransport`]; tests substitute scripted transports to
/// drive the retry and fee logic without a network.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Returns the `result` member of the response.
    ///
    /// # Errors
    ///
    /// Returns the transport failure, or [`UpstreamError::RpcError`] when the provider
    /// answered with a JSON-RPC error object.
    async fn send(&self, endpoint: &Endpoint, request: &JsonRpcRequest)
        -> Result<Value, UpstreamError>;
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    http_client: Arc<HttpClient>,
}

impl HttpTransport {
    #[must_use]
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        request: &JsonRpcRequest,
    ) -> Result<Value, UpstreamError> {
        let body = serde_json::to_vec(request).map_err(|e| {
            UpstreamError::InvalidRequest(format!("Failed to serialize request: {e}"))
        })?;

        let response_bytes =
            self.http_client.send_request(endpoint.url(), body.into(), endpoint.timeout()).await?;

        let response: JsonRpcResponse = serde_json::from_slice(&response_bytes)
            .map_err(|e| UpstreamError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        if let Some(error) = response.error {
            return Err(UpstreamError::RpcError(error.code, error.message));
        }

        response
            .result
            .ok_or_else(|| UpstreamError::InvalidResponse("response has no result".to_string()))
    }
}

/// Parameters of an `eth_call`.
#[derive(Debug, Clone, Serialize)]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// A client bound to the endpoint selected for one attempt.
#[derive(Clone)]
pub struct RpcClient {
    endpoint: Arc<Endpoint>,
    transport: Arc<dyn RpcTransport>,
}

impl RpcClient {
    #[must_use]
    pub fn new(endpoint: Arc<Endpoint>, transport: Arc<dyn RpcTransport>) -> Self {
        Self { endpoint, transport }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    /// Issues a raw JSON-RPC request.
    ///
    /// # Errors
    ///
    /// Propagates the transport error.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, Some(params), json!(id));

        tracing::trace!(
            endpoint = %self.endpoint.name(),
            method = method,
            id = id,
            "sending rpc request"
        );

        self.transport.send(&self.endpoint, &request).await
    }

    /// Runs a read-only call against `block` (`"latest"`, `"pending"` or a hex number) and
    /// returns the raw return data.
    ///
    /// # Errors
    ///
    /// Propagates the transport error; a result that is not hex data is
    /// [`UpstreamError::InvalidResponse`].
    pub async fn eth_call(&self, call: &CallRequest, block: &str) -> Result<Bytes, UpstreamError> {
        let params = serde_json::to_value(call).map_err(|e| {
            UpstreamError::InvalidRequest(format!("Failed to serialize call: {e}"))
        })?;
        let result = self.request("eth_call", json!([params, block])).await?;

        let hex = result.as_str().ok_or_else(|| {
            UpstreamError::InvalidResponse(format!("eth_call result is not a string: {result}"))
        })?;
        hex.parse::<Bytes>()
            .map_err(|e| UpstreamError::InvalidResponse(format!("eth_call result is not hex: {e}")))
    }
}
