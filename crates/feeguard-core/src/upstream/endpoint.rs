use parking_lot::Mutex;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

use crate::types::EndpointConfig;

/// Mutable health bookkeeping of one endpoint.
///
/// `rate_limited_until` doubles as the rate-limit flag: an endpoint is rate limited exactly
/// when a reset time is recorded.
#[derive(Debug, Clone, Default)]
struct EndpointHealth {
    error_count: u32,
    rate_limited_until: Option<Instant>,
    last_error_at: Option<Instant>,
}

/// Derived state of an endpoint, used for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointState {
    /// No recorded errors.
    Healthy,
    /// Some errors, still selectable.
    Degraded,
    /// Error count reached the limit; excluded until a global reset.
    Unusable,
    /// Cooling down after a rate-limit signal.
    RateLimited,
}

impl EndpointState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unusable => "unusable",
            Self::RateLimited => "rate_limited",
        }
    }
}

/// Point-in-time copy of an endpoint's state.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSnapshot {
    pub name: String,
    pub url: String,
    pub priority: u32,
    pub error_count: u32,
    pub rate_limited: bool,
    /// Time left until the rate-limit cooldown ends.
    pub rate_limit_remaining_ms: Option<u64>,
    /// Time since the last recorded error.
    pub last_error_ago_ms: Option<u64>,
    pub state: EndpointState,
}

/// One JSON-RPC provider with its health counters.
///
/// Endpoints are created once from configuration and live for the whole process. All
/// mutation goes through [`crate::upstream::EndpointRegistry`]; each change holds the
/// endpoint's own lock so concurrent success and error reports never lose an update.
#[derive(Debug)]
pub struct Endpoint {
    config: EndpointConfig,
    health: Mutex<EndpointHealth>,
}

impl Endpoint {
    #[must_use]
    pub fn new(config: EndpointConfig) -> Self {
        Self { config, health: Mutex::new(EndpointHealth::default()) }
    }

    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.config.name
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }

    #[must_use]
    pub fn priority(&self) -> u32 {
        self.config.priority
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.health.lock().error_count
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.health.lock().rate_limited_until.is_some()
    }

    #[must_use]
    pub fn rate_limit_reset_at(&self) -> Option<Instant> {
        self.health.lock().rate_limited_until
    }

    #[must_use]
    pub fn last_error_at(&self) -> Option<Instant> {
        self.health.lock().last_error_at
    }

    /// Returns the ranking key if the endpoint may be selected at `now`.
    ///
    /// Excluded are endpoints still inside a rate-limit cooldown and endpoints whose error
    /// count reached `max_error_count`. The key orders by priority, then error count.
    pub(crate) fn selection_key(&self, now: Instant, max_error_count: u32) -> Option<(u32, u32)> {
        let health = self.health.lock();
        if health.rate_limited_until.is_some_and(|reset_at| now < reset_at) {
            return None;
        }
        if health.error_count >= max_error_count {
            return None;
        }
        Some((self.config.priority, health.error_count))
    }

    /// Decrements the error count (never below zero) and clears any rate limit.
    ///
    /// Returns the new error count.
    pub(crate) fn record_success(&self) -> u32 {
        let mut health = self.health.lock();
        health.error_count = health.error_count.saturating_sub(1);
        health.rate_limited_until = None;
        health.error_count
    }

    /// Increments the error count and, for rate limits, starts a cooldown ending at
    /// `now + cooldown`.
    ///
    /// Returns the new error count.
    pub(crate) fn record_error(&self, now: Instant, rate_limit_cooldown: Option<Duration>) -> u32 {
        let mut health = self.health.lock();
        health.error_count = health.error_count.saturating_add(1);
        health.last_error_at = Some(now);
        if let Some(cooldown) = rate_limit_cooldown {
            health.rate_limited_until = Some(now + cooldown);
        }
        health.error_count
    }

    /// Lifts an expired rate limit and forgives one error.
    ///
    /// Returns `true` if the endpoint was rehabilitated.
    pub(crate) fn rehabilitate_if_expired(&self, now: Instant) -> bool {
        let mut health = self.health.lock();
        match health.rate_limited_until {
            Some(reset_at) if now >= reset_at => {
                health.rate_limited_until = None;
                health.error_count = health.error_count.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Clears error count and rate limit. `last_error_at` is kept for diagnostics.
    pub(crate) fn reset(&self) {
        let mut health = self.health.lock();
        health.error_count = 0;
        health.rate_limited_until = None;
    }

    /// Derives the endpoint state at `now`.
    #[must_use]
    pub fn state(&self, now: Instant, max_error_count: u32) -> EndpointState {
        let health = self.health.lock();
        Self::state_of(&health, now, max_error_count)
    }

    fn state_of(health: &EndpointHealth, now: Instant, max_error_count: u32) -> EndpointState {
        if health.rate_limited_until.is_some_and(|reset_at| now < reset_at) {
            EndpointState::RateLimited
        } else if health.error_count >= max_error_count {
            EndpointState::Unusable
        } else if health.error_count == 0 {
            EndpointState::Healthy
        } else {
            EndpointState::Degraded
        }
    }

    /// Takes a consistent snapshot under a single lock acquisition.
    #[must_use]
    pub fn snapshot(&self, now: Instant, max_error_count: u32) -> EndpointSnapshot {
        let health = self.health.lock();
        let as_millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        EndpointSnapshot {
            name: self.config.name.to_string(),
            url: self.config.url.clone(),
            priority: self.config.priority,
            error_count: health.error_count,
            rate_limited: health.rate_limited_until.is_some(),
            rate_limit_remaining_ms: health
                .rate_limited_until
                .map(|reset_at| as_millis(reset_at.saturating_duration_since(now))),
            last_error_ago_ms: health
                .last_error_at
                .map(|at| as_millis(now.saturating_duration_since(at))),
            state: Self::state_of(&health, now, max_error_count),
        }
    }
}
