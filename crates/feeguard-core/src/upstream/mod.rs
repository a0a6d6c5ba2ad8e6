//! Upstream RPC provider management.
//!
//! This module handles reads against a ranked pool of unreliable JSON-RPC providers:
//! - [`EndpointRegistry`] holds every configured endpoint with its error count and
//!   rate-limit cooldown, and picks the best usable one
//! - [`RetryExecutor`] runs a read with endpoint rotation and exponential backoff
//! - [`RateLimitResetScheduler`] periodically lifts expired rate limits
//! - [`RpcTransport`] / [`HttpTransport`] put JSON-RPC requests on the wire
//!
//! # Endpoint lifecycle
//!
//! ```text
//!            error                 5th error
//! Healthy ─────────► Degraded ─────────────► Unusable
//!    ▲                  ▲                       │
//!    │   success        │   global reset        │
//!    └──────────────────┴───────────────────────┘
//!
//! any state ── 429 / rate-limit message ──► RateLimited
//! RateLimited ── cooldown elapsed + reset tick ──► error_count - 1
//! ```
//!
//! A global reset happens only when no endpoint is selectable at all, so a pool that is
//! entirely throttled or failing still makes forward progress.

pub mod endpoint;
pub mod errors;
pub mod http_client;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod transport;

pub use endpoint::{Endpoint, EndpointSnapshot, EndpointState};
pub use errors::{FailureKind, RpcErrorCategory, UpstreamError};
pub use http_client::{HttpClient, HttpClientConfig};
pub use registry::{EndpointRegistry, RegistryConfig};
pub use retry::{RetryError, RetryExecutor, RetryPolicy};
pub use scheduler::RateLimitResetScheduler;
pub use transport::{CallRequest, HttpTransport, RpcClient, RpcTransport};
