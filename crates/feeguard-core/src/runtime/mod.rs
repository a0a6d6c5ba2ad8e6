//! Runtime initialization and lifecycle management.
//!
//! Wires the registry, HTTP transport, retry executor, price cache and fee resolver from an
//! [`AppConfig`](crate::config::AppConfig), and owns the background rate-limit scheduler.
//!
//! # Examples
//!
//! ```no_run
//! use feeguard_core::{config::AppConfig, runtime::FeeguardRuntime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!
//!     let runtime = FeeguardRuntime::builder()
//!         .with_config(config)
//!         .enable_rate_limit_scheduler()
//!         .build()?;
//!
//!     let quote = runtime.fee_resolver().get_unclaimed_fees("12345").await?;
//!     println!("{}", serde_json::to_string_pretty(&quote)?);
//!
//!     runtime.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod components;
pub mod lifecycle;

pub use builder::{FeeguardRuntimeBuilder, RuntimeError};
pub use components::FeeguardComponents;
pub use lifecycle::FeeguardRuntime;
