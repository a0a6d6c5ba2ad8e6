use thiserror::Error;

/// Classification of JSON-RPC errors by error code and message.
///
/// Provider errors and rate limits say something about the endpoint that served the call;
/// execution errors (reverts) are a property of the chain state and read the same on every
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorCategory {
    /// Invalid request, method not found, invalid params.
    ClientError,
    /// Internal error and the generic server error range.
    ProviderError,
    /// Rate limiting at JSON-RPC level (-32005).
    RateLimit,
    /// Parse error from upstream - malformed response.
    ParseError,
    /// Execution errors (reverts, out of gas) of the simulated call.
    ExecutionError,
}

impl RpcErrorCategory {
    /// Classifies a JSON-RPC error code and message into a category.
    ///
    /// Standard JSON-RPC error codes:
    /// - -32700: Parse error
    /// - -32600..=-32602: Invalid request / method / params
    /// - -32603: Internal error
    /// - -32005: Limit exceeded (rate limiting)
    /// - -32000 to -32099: Server errors, inspected for revert messages
    ///
    /// Some providers report execution reverts with code `3` and revert data attached, so any
    /// message mentioning a revert is treated as an execution error regardless of code.
    #[must_use]
    pub fn from_code_and_message(code: i32, message: &str) -> Self {
        let message_lower = message.to_lowercase();
        if message_lower.contains("revert") || message_lower.contains("out of gas") {
            return Self::ExecutionError;
        }
        if message_lower.contains("rate limit") || message_lower.contains("too many request") {
            return Self::RateLimit;
        }

        match code {
            -32700 => Self::ParseError,
            -32602..=-32600 => Self::ClientError,
            -32005 => Self::RateLimit,
            3 => Self::ExecutionError,
            _ => Self::ProviderError,
        }
    }

    /// Returns a static string representation for metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientError => "client_error",
            Self::ProviderError => "provider_error",
            Self::RateLimit => "rate_limit",
            Self::ParseError => "parse_error",
            Self::ExecutionError => "execution_error",
        }
    }
}

/// How a failed attempt is reported back to the endpoint registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// HTTP 429 or a provider rate-limit message. Penalises and starts a cooldown.
    RateLimit,
    /// Timeouts and connection failures. Penalises the endpoint.
    Transient,
    /// The simulated call reverted. Endpoint-independent, never retried.
    Revert,
    /// Anything else the endpoint got wrong. Penalises the endpoint.
    Other,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::Transient => "transient",
            Self::Revert => "revert",
            Self::Other => "other",
        }
    }
}

/// Errors that can occur when interacting with upstream RPC providers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpstreamError {
    /// Request exceeded the configured timeout duration.
    #[error("Request timeout")]
    Timeout,

    /// Failed to establish a connection to the upstream endpoint.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP-level error occurred (non-2xx status code).
    ///
    /// First field is the HTTP status code, second is the (truncated) response body.
    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    /// JSON-RPC error returned by the upstream provider.
    ///
    /// First field is the RPC error code, second is the error message.
    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),

    /// Network-level error from the underlying HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response from upstream could not be parsed or was malformed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built before being sent to upstream.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Maximum concurrent requests limit has been reached.
    #[error("Concurrency limit reached: {0}")]
    ConcurrencyLimit(String),
}

impl UpstreamError {
    /// Returns the RPC error category if this is an RPC error.
    #[must_use]
    pub fn rpc_category(&self) -> Option<RpcErrorCategory> {
        match self {
            Self::RpcError(code, message) => {
                Some(RpcErrorCategory::from_code_and_message(*code, message))
            }
            _ => None,
        }
    }

    /// Returns `true` if the provider signalled throttling.
    ///
    /// Matches HTTP 429, JSON-RPC -32005, and any error text containing `429`,
    /// `too many request` or `rate limit` (case-insensitive).
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::HttpError(429, _) => true,
            Self::RpcError(..) => {
                self.rpc_category() == Some(RpcErrorCategory::RateLimit) ||
                    message_signals_rate_limit(&self.to_string())
            }
            _ => message_signals_rate_limit(&self.to_string()),
        }
    }

    /// Returns `true` for timeouts and connection level failures.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) | Self::Network(_) => true,
            Self::HttpError(status, _) => (500..=599).contains(status),
            _ => {
                let message = self.to_string().to_lowercase();
                message.contains("timeout") || message.contains("timed out")
            }
        }
    }

    /// Returns `true` if the simulated call itself reverted.
    ///
    /// A revert is a property of chain state, so trying another endpoint yields the same
    /// answer.
    #[must_use]
    pub fn is_execution_revert(&self) -> bool {
        self.rpc_category() == Some(RpcErrorCategory::ExecutionError)
    }

    /// Classifies this error for endpoint bookkeeping.
    ///
    /// Rate limits win over the other kinds: a 429 that also mentions a timeout still starts
    /// a cooldown.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        if self.is_execution_revert() {
            FailureKind::Revert
        } else if self.is_rate_limit() {
            FailureKind::RateLimit
        } else if self.is_transient() {
            FailureKind::Transient
        } else {
            FailureKind::Other
        }
    }
}

fn message_signals_rate_limit(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("429") ||
        message.contains("too many request") ||
        message.contains("rate limit")
}
