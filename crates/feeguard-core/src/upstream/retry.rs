use std::{future::Future, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::time::Instant;

use crate::{
    metrics::MetricsCollector,
    upstream::{
        errors::{FailureKind, UpstreamError},
        registry::EndpointRegistry,
        transport::{RpcClient, RpcTransport},
    },
};

/// Bounds of one retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubled after every further failure.
    pub base_delay: Duration,
    /// Optional cap on the whole loop, attempt latency plus backoff.
    pub total_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(1000), total_timeout: None }
    }
}

impl RetryPolicy {
    /// Backoff after failed attempt `attempt` (1-based): `base_delay * 2^(attempt - 1)`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Terminal outcome of a retry loop that did not produce a value.
#[derive(Error, Debug)]
pub enum RetryError {
    /// Every attempt failed. Carries the error of the final attempt.
    #[error("all {attempts} attempts failed, last error: {last_error}")]
    Exhausted { attempts: u32, last_error: UpstreamError },

    /// The call reverted. Reverts do not depend on the endpoint, so no retry was made.
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The loop ran past its total timeout.
    #[error("retry deadline exceeded after {attempts} attempts ({elapsed:?})")]
    DeadlineExceeded { attempts: u32, elapsed: Duration },
}

impl RetryError {
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted(_))
    }

    /// Number of attempts made before giving up.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::DeadlineExceeded { attempts, .. } => *attempts,
            Self::Reverted(_) => 1,
        }
    }
}

/// Runs read operations across the endpoint pool with rotation and exponential backoff.
///
/// Every attempt asks the registry for the best endpoint, so a failure that demotes an
/// endpoint moves the next attempt elsewhere. Backoff sleeps are async and each call runs
/// its own independent loop.
pub struct RetryExecutor {
    registry: Arc<EndpointRegistry>,
    transport: Arc<dyn RpcTransport>,
    policy: RetryPolicy,
    metrics: MetricsCollector,
}

impl RetryExecutor {
    #[must_use]
    pub fn new(
        registry: Arc<EndpointRegistry>,
        transport: Arc<dyn RpcTransport>,
        policy: RetryPolicy,
    ) -> Self {
        Self { registry, transport, policy, metrics: MetricsCollector::new() }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, reverts, or the policy is exhausted.
    ///
    /// On success the endpoint is credited. On a revert the endpoint is credited too (it
    /// answered correctly) and the revert is returned at once. Any other failure is charged
    /// to the endpoint, with a cooldown for rate limits, and followed by a backoff sleep if
    /// attempts remain.
    ///
    /// # Errors
    ///
    /// - [`RetryError::Reverted`] if the call reverted
    /// - [`RetryError::Exhausted`] after `max_attempts` failures
    /// - [`RetryError::DeadlineExceeded`] if `total_timeout` elapses first
    pub async fn execute_with_retry<T, F, Fut>(&self, operation: F) -> Result<T, RetryError>
    where
        F: Fn(RpcClient) -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let started = Instant::now();
        let deadline = self.policy.total_timeout.map(|timeout| started + timeout);
        let mut attempt = 1;

        loop {
            let endpoint = self.registry.select_endpoint();
            let client = RpcClient::new(Arc::clone(&endpoint), Arc::clone(&self.transport));

            let outcome = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, operation(client)).await {
                    Ok(outcome) => outcome,
                    Err(_) => return Err(self.deadline_exceeded(attempt, started)),
                },
                None => operation(client).await,
            };

            let error = match outcome {
                Ok(value) => {
                    self.registry.mark_success(&endpoint);
                    self.metrics.record_attempt(endpoint.name(), "success");
                    tracing::debug!(
                        endpoint = %endpoint.name(),
                        attempt = attempt,
                        "rpc attempt succeeded"
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            let kind = error.failure_kind();
            self.metrics.record_failure(endpoint.name(), kind);

            if kind == FailureKind::Revert {
                self.registry.mark_success(&endpoint);
                tracing::debug!(
                    endpoint = %endpoint.name(),
                    attempt = attempt,
                    error = %error,
                    "call reverted, not retrying"
                );
                return Err(RetryError::Reverted(error.to_string()));
            }

            self.registry.mark_error(&endpoint, kind == FailureKind::RateLimit);

            if attempt >= max_attempts {
                tracing::warn!(
                    endpoint = %endpoint.name(),
                    attempts = attempt,
                    error = %error,
                    "rpc retries exhausted"
                );
                self.metrics.record_retry_exhausted("attempts");
                return Err(RetryError::Exhausted { attempts: attempt, last_error: error });
            }

            let delay = self.policy.backoff_for(attempt);
            tracing::warn!(
                endpoint = %endpoint.name(),
                attempt = attempt,
                max_attempts = max_attempts,
                failure = kind.as_str(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "rpc attempt failed, backing off"
            );

            if let Some(deadline) = deadline {
                if Instant::now() + delay >= deadline {
                    return Err(self.deadline_exceeded(attempt, started));
                }
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn deadline_exceeded(&self, attempts: u32, started: Instant) -> RetryError {
        let elapsed = started.elapsed();
        tracing::warn!(
            attempts = attempts,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "rpc retry deadline exceeded"
        );
        self.metrics.record_retry_exhausted("deadline");
        RetryError::DeadlineExceeded { attempts, elapsed }
    }
}
