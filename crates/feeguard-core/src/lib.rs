//! # Feeguard Core
//!
//! Resilient on-chain reads and USD pricing for concentrated-liquidity fee positions.
//!
//! Public JSON-RPC providers rate-limit, time out and fail intermittently; price feeds go
//! down. This crate keeps answering anyway:
//!
//! - **[`upstream`]**: ranked endpoint registry with error counting and rate-limit cooldowns,
//!   a retry executor with exponential backoff that rotates endpoints between attempts, and
//!   a periodic rehabilitation scheduler.
//!
//! - **[`fees`]**: unclaimed fee resolution through an ordered chain of strategies (simulated
//!   `collect`, then the stored `tokensOwed` counters).
//!
//! - **[`pricing`]**: per-symbol USD price cache that never surfaces a fetch failure, and
//!   exact raw-amount to USD conversion.
//!
//! - **[`metrics`]**: Prometheus counters and gauges for attempts, penalties and fallbacks.
//!
//! - **[`runtime`]**: builder wiring everything from [`config::AppConfig`], with graceful
//!   shutdown of background tasks.
//!
//! ## Request Flow
//!
//! ```text
//! get_unclaimed_fees(id)
//!        │
//!        ▼
//! ┌───────────────┐   select_endpoint()   ┌──────────────────┐
//! │ RetryExecutor │ ────────────────────► │ EndpointRegistry │
//! │  (backoff)    │ ◄──── mark_success ── │  priority, errors│
//! └──────┬────────┘       mark_error      │  rate limits     │
//!        │                                └────────▲─────────┘
//!        ▼                                         │ reset_tick()
//!   eth_call over HTTP                    RateLimitResetScheduler
//!        │
//!        ▼
//!  FeeStrategy chain ──► raw amounts ──► PriceOracleCache ──► FeeQuote
//! ```

pub mod config;
pub mod fees;
pub mod metrics;
pub mod pricing;
pub mod runtime;
pub mod types;
pub mod upstream;
