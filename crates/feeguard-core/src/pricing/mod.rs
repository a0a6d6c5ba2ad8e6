//! USD pricing of raw token amounts.
//!
//! [`PriceOracleCache`] serves per-symbol prices that degrade (stale value, then a static
//! constant) instead of failing; [`to_usd`] turns raw integer amounts plus prices into a
//! [`UsdBreakdown`].

pub mod cache;
pub mod converter;
pub mod source;
pub mod tokens;

pub use cache::{default_fallback_prices, PriceCacheConfig, PriceEntry, PriceOracleCache};
pub use converter::{
    raw_to_units, to_usd, to_usd_18, ConversionError, UsdBreakdown, DEFAULT_DECIMALS,
};
pub use source::{HttpPriceSource, PriceError, PriceSource};
pub use tokens::{TokenInfo, TokenRegistry};
