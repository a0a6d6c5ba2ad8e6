//! Unclaimed fee resolution for concentrated-liquidity positions.
//!
//! ```text
//! get_unclaimed_fees(id)
//!        │
//!        ▼
//! positions(id) ── revert ──► PositionNotFound
//!        │
//!        ├─ no liquidity, nothing owed ──► zero quote (ZeroShortCircuit)
//!        │
//!        ▼
//! SimulateCollect ── no result ──► StoredTokensOwed
//!        │                               │
//!        ▼                               ▼
//!   quote (Simulate)              quote (FallbackRead)
//! ```
//!
//! Every read goes through [`crate::upstream::RetryExecutor`].

pub mod abi;
pub mod position;
pub mod resolver;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_support;

use thiserror::Error;

use crate::upstream::RetryError;

pub use position::{PositionReader, PositionRecord, RawFees};
pub use resolver::FeeResolver;
pub use strategy::{FeeStrategy, SimulateCollect, StoredTokensOwed};

/// Errors surfaced by fee resolution.
///
/// Returning zero fees when the true amount is unknown would be silently wrong, so every
/// failure to obtain amounts is an error here.
#[derive(Error, Debug)]
pub enum FeeError {
    #[error("invalid position id {0:?}")]
    InvalidPositionId(String),

    #[error("position {0} does not exist")]
    PositionNotFound(String),

    #[error("rpc read failed: {0}")]
    Rpc(#[from] RetryError),

    #[error("failed to decode {call} return data: {message}")]
    Decode { call: &'static str, message: String },

    #[error("no fee strategy produced a result for position {0}")]
    NoStrategyResult(String),
}
