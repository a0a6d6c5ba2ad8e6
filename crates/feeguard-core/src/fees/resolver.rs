use alloy_primitives::U256;
use std::sync::Arc;

use crate::{
    fees::{
        position::{PositionReader, PositionRecord, RawFees},
        strategy::{FeeStrategy, SimulateCollect, StoredTokensOwed},
        FeeError,
    },
    metrics::MetricsCollector,
    pricing::{to_usd, PriceOracleCache, TokenRegistry, UsdBreakdown},
    types::{FeeQuote, FeeSource},
};

/// Computes unclaimed fees of liquidity positions.
///
/// Reads the position record, short-circuits empty positions, then runs the fee strategies
/// in order (collect simulation first, stored `tokensOwed` as fallback). Raw amounts are
/// priced in USD on a best-effort basis: a pricing failure leaves `usd_value` empty but
/// never fails the quote.
pub struct FeeResolver {
    reader: Arc<PositionReader>,
    strategies: Vec<Box<dyn FeeStrategy>>,
    prices: Arc<PriceOracleCache>,
    tokens: TokenRegistry,
    metrics: MetricsCollector,
}

impl FeeResolver {
    /// Creates a resolver with the default strategy chain: simulate, then stored counters.
    #[must_use]
    pub fn new(
        reader: Arc<PositionReader>,
        prices: Arc<PriceOracleCache>,
        tokens: TokenRegistry,
    ) -> Self {
        let strategies: Vec<Box<dyn FeeStrategy>> = vec![
            Box::new(SimulateCollect::new(Arc::clone(&reader))),
            Box::new(StoredTokensOwed),
        ];
        Self { reader, strategies, prices, tokens, metrics: MetricsCollector::new() }
    }

    /// Replaces the strategy chain.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn FeeStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the unclaimed fees of the position with decimal id `position_id`.
    ///
    /// # Errors
    ///
    /// - [`FeeError::InvalidPositionId`] if the id is not a decimal integer
    /// - [`FeeError::PositionNotFound`] if the position does not exist
    /// - [`FeeError::Rpc`] / [`FeeError::Decode`] if the position record cannot be read
    /// - [`FeeError::NoStrategyResult`] if no strategy produced amounts
    /// - any error a strategy returns
    pub async fn get_unclaimed_fees(&self, position_id: &str) -> Result<FeeQuote, FeeError> {
        let token_id = parse_position_id(position_id)?;
        let position = self.reader.read_position(token_id).await?;

        if position.is_empty() {
            tracing::debug!(position_id = %token_id, "empty position, skipping fee computation");
            self.metrics.record_fee_quote(FeeSource::ZeroShortCircuit);
            let zero = UsdBreakdown { token0_usd: 0.0, token1_usd: 0.0, total_usd: 0.0 };
            return Ok(quote(&position, RawFees::ZERO, Some(zero), FeeSource::ZeroShortCircuit));
        }

        for strategy in &self.strategies {
            let source = strategy.source();
            match strategy.resolve(&position).await? {
                Some(fees) => {
                    tracing::debug!(
                        position_id = %token_id,
                        source = %source,
                        amount0 = %fees.amount0,
                        amount1 = %fees.amount1,
                        "fees resolved"
                    );
                    self.metrics.record_fee_quote(source);
                    let usd = self.price(&position, &fees).await;
                    return Ok(quote(&position, fees, usd, source));
                }
                None => self.metrics.record_fee_strategy_miss(source),
            }
        }

        Err(FeeError::NoStrategyResult(token_id.to_string()))
    }

    /// Prices `fees` in USD, or `None` when either token cannot be priced.
    async fn price(&self, position: &PositionRecord, fees: &RawFees) -> Option<UsdBreakdown> {
        let (Some(token0), Some(token1)) =
            (self.tokens.by_address(&position.token0), self.tokens.by_address(&position.token1))
        else {
            tracing::debug!(
                token0 = %position.token0,
                token1 = %position.token1,
                "token not configured, fee quote left unpriced"
            );
            return None;
        };

        let (price0, price1) = tokio::join!(
            self.prices.price_or_none(&token0.symbol),
            self.prices.price_or_none(&token1.symbol)
        );
        let (Some(price0), Some(price1)) = (price0, price1) else {
            tracing::warn!(
                token0 = %token0.symbol,
                token1 = %token1.symbol,
                "no usd price for a token, fee quote left unpriced"
            );
            return None;
        };

        match to_usd(
            &fees.amount0.to_string(),
            &fees.amount1.to_string(),
            price0,
            price1,
            token0.decimals,
            token1.decimals,
        ) {
            Ok(breakdown) => Some(breakdown),
            Err(e) => {
                tracing::warn!(error = %e, "usd conversion failed, fee quote left unpriced");
                None
            }
        }
    }
}

fn parse_position_id(position_id: &str) -> Result<U256, FeeError> {
    let trimmed = position_id.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FeeError::InvalidPositionId(position_id.to_string()));
    }
    U256::from_str_radix(trimmed, 10)
        .map_err(|_| FeeError::InvalidPositionId(position_id.to_string()))
}

fn quote(
    position: &PositionRecord,
    fees: RawFees,
    usd: Option<UsdBreakdown>,
    source: FeeSource,
) -> FeeQuote {
    FeeQuote {
        position_id: position.token_id.to_string(),
        token0: position.token0.to_checksum(None),
        token1: position.token1.to_checksum(None),
        token0_raw: fees.amount0.to_string(),
        token1_raw: fees.amount1.to_string(),
        usd_value: usd.map(|breakdown| breakdown.total_usd),
        usd_breakdown: usd,
        source_method: source,
    }
}
