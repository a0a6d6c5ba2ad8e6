use reqwest::{Client, ClientBuilder, Response};
use std::{sync::Arc, time::Duration};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::upstream::UpstreamError;

/// Response bodies longer than this are truncated before they end up in error messages.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Configuration for HTTP client concurrency and timeout behavior.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum number of concurrent HTTP requests allowed
    pub concurrent_limit: usize,
    /// Permit acquisition timeout in milliseconds
    pub permit_timeout_ms: u64,
    /// Connect timeout in seconds
    pub connect_timeout_seconds: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { concurrent_limit: 64, permit_timeout_ms: 2_000, connect_timeout_seconds: 5 }
    }
}

/// HTTP client with semaphore-based concurrency control.
///
/// Shared by the RPC transport and the price feed. It makes exactly one attempt per call;
/// retrying and endpoint rotation belong to [`crate::upstream::RetryExecutor`].
pub struct HttpClient {
    client: Client,
    concurrent_limit: Arc<Semaphore>,
    config: HttpClientConfig,
}

/// RAII guard ensuring semaphore permits are always released.
///
/// Uses [`OwnedSemaphorePermit`] which owns an `Arc` to the semaphore,
/// making it safe to hold across async boundaries.
struct PermitGuard {
    _permit: OwnedSemaphorePermit,
    semaphore: Arc<Semaphore>,
}

impl PermitGuard {
    fn new(permit: OwnedSemaphorePermit, semaphore: Arc<Semaphore>) -> Self {
        Self { _permit: permit, semaphore }
    }

    fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        tracing::trace!(
            available_permits = self.semaphore.available_permits(),
            "permit guard dropped"
        );
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Creates a new HTTP client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, UpstreamError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(45))
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("feeguard/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                UpstreamError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            concurrent_limit: Arc::new(Semaphore::new(config.concurrent_limit)),
            config,
        })
    }

    /// Sanitizes network errors so URLs (which often embed provider API keys) never end up
    /// in logs or error messages.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_timeout() {
            "connection timed out".to_string()
        } else if error.is_request() {
            "request failed".to_string()
        } else if error.is_body() {
            "response body error".to_string()
        } else if error.is_decode() {
            "response decode error".to_string()
        } else if error.is_redirect() {
            "too many redirects".to_string()
        } else {
            "network error".to_string()
        }
    }

    async fn acquire_permit(&self) -> Result<PermitGuard, UpstreamError> {
        let permit_timeout = Duration::from_millis(self.config.permit_timeout_ms);

        let permit = tokio::time::timeout(
            permit_timeout,
            Arc::clone(&self.concurrent_limit).acquire_owned(),
        )
        .await
        .map_err(|_| {
            tracing::warn!(
                available_permits = self.concurrent_limit.available_permits(),
                "http client semaphore acquisition timeout"
            );
            UpstreamError::Timeout
        })?
        .map_err(|_| {
            UpstreamError::ConcurrencyLimit("http client semaphore closed".to_string())
        })?;

        Ok(PermitGuard::new(permit, Arc::clone(&self.concurrent_limit)))
    }

    /// Sends an HTTP POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Timeout`] if permit acquisition or the request times out
    /// - [`UpstreamError::ConcurrencyLimit`] if the semaphore is closed
    /// - [`UpstreamError::HttpError`] for non-success HTTP status codes
    /// - [`UpstreamError::ConnectionFailed`] for other network failures
    pub async fn send_request(
        &self,
        url: &str,
        body: bytes::Bytes,
        timeout: Duration,
    ) -> Result<bytes::Bytes, UpstreamError> {
        let permit_guard = self.acquire_permit().await?;
        tracing::trace!(available_permits = permit_guard.available_permits(), "http post started");

        let result = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(body)
            .timeout(timeout)
            .send()
            .await;

        Self::read_body(result).await
    }

    /// Sends an HTTP GET request and returns the response body.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::send_request`].
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<bytes::Bytes, UpstreamError> {
        let permit_guard = self.acquire_permit().await?;
        tracing::trace!(available_permits = permit_guard.available_permits(), "http get started");

        let result = self
            .client
            .get(url)
            .header("accept", "application/json")
            .timeout(timeout)
            .send()
            .await;

        Self::read_body(result).await
    }

    async fn read_body(
        result: Result<Response, reqwest::Error>,
    ) -> Result<bytes::Bytes, UpstreamError> {
        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(UpstreamError::Timeout),
            Err(e) => {
                return Err(UpstreamError::ConnectionFailed(Self::sanitize_network_error(&e)));
            }
        };

        let status = response.status();
        if status.is_success() {
            return response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::ConnectionFailed(Self::sanitize_network_error(&e))
                }
            });
        }

        let raw_text = response.text().await.unwrap_or_default();
        let body = truncate_body(raw_text);
        tracing::trace!(status = status.as_u16(), "http request failed");
        Err(UpstreamError::HttpError(status.as_u16(), body))
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.concurrent_limit.available_permits()
    }
}

fn truncate_body(raw: String) -> String {
    if raw.len() <= MAX_ERROR_BODY_LEN {
        return raw;
    }
    let mut cut = MAX_ERROR_BODY_LEN;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... (truncated)", &raw[..cut])
}
