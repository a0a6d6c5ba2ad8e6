use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimals assumed when a token's precision is unknown.
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The raw amount is not a non-empty string of ASCII digits.
    #[error("invalid raw amount: {0:?}")]
    InvalidAmount(String),

    /// The price is negative or not finite.
    #[error("invalid price: {0}")]
    InvalidPrice(f64),
}

/// USD value of a pair of token amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsdBreakdown {
    #[serde(rename = "token0USD")]
    pub token0_usd: f64,
    #[serde(rename = "token1USD")]
    pub token1_usd: f64,
    #[serde(rename = "totalUSD")]
    pub total_usd: f64,
}

/// Converts raw integer amounts into USD: `(raw / 10^decimals) * price` per token.
///
/// # Errors
///
/// Returns [`ConversionError`] if an amount is not a decimal integer string or a price is
/// negative or not finite.
pub fn to_usd(
    token0_raw: &str,
    token1_raw: &str,
    price0: f64,
    price1: f64,
    decimals0: u8,
    decimals1: u8,
) -> Result<UsdBreakdown, ConversionError> {
    let token0_usd = raw_to_units(token0_raw, decimals0)? * check_price(price0)?;
    let token1_usd = raw_to_units(token1_raw, decimals1)? * check_price(price1)?;
    Ok(UsdBreakdown { token0_usd, token1_usd, total_usd: token0_usd + token1_usd })
}

/// [`to_usd`] with 18 decimals for both tokens.
///
/// # Errors
///
/// Same as [`to_usd`].
pub fn to_usd_18(
    token0_raw: &str,
    token1_raw: &str,
    price0: f64,
    price1: f64,
) -> Result<UsdBreakdown, ConversionError> {
    to_usd(token0_raw, token1_raw, price0, price1, DEFAULT_DECIMALS, DEFAULT_DECIMALS)
}

/// Scales a raw integer amount down by `10^decimals`.
///
/// The decimal point is placed textually before parsing, so amounts far beyond `u64` (any
/// `uint256`) convert with a single rounding step.
///
/// # Errors
///
/// Returns [`ConversionError::InvalidAmount`] for empty or non-digit input.
pub fn raw_to_units(raw: &str, decimals: u8) -> Result<f64, ConversionError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConversionError::InvalidAmount(raw.to_string()));
    }

    let digits = raw.trim_start_matches('0');
    let decimals = usize::from(decimals);

    let text = if decimals == 0 {
        if digits.is_empty() { "0".to_string() } else { digits.to_string() }
    } else if digits.len() > decimals {
        let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
        format!("{int_part}.{frac_part}")
    } else {
        format!("0.{}{digits}", "0".repeat(decimals - digits.len()))
    };

    text.parse::<f64>().map_err(|_| ConversionError::InvalidAmount(raw.to_string()))
}

fn check_price(price: f64) -> Result<f64, ConversionError> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(ConversionError::InvalidPrice(price))
    }
}
