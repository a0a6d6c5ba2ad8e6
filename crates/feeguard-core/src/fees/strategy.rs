use alloy_primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    fees::{
        position::{PositionReader, PositionRecord, RawFees},
        FeeError,
    },
    types::FeeSource,
};

/// One way of computing the unclaimed fees of a position.
///
/// Strategies run in order; the first one returning `Ok(Some(_))` wins. `Ok(None)` means
/// "no result, try the next one". An `Err` aborts resolution and reaches the caller
/// unchanged.
#[async_trait]
pub trait FeeStrategy: Send + Sync {
    /// Tag recorded on quotes this strategy produces.
    fn source(&self) -> FeeSource;

    /// Computes the fees of `position`.
    ///
    /// # Errors
    ///
    /// A failure that must not be papered over by a later strategy.
    async fn resolve(&self, position: &PositionRecord) -> Result<Option<RawFees>, FeeError>;
}

/// Simulates `collect` as the position owner with maximal amounts.
///
/// Matches what the exchange interface reports as pending fees. Any failure (retries
/// exhausted, revert, undecodable data) yields no result so a fallback can answer.
pub struct SimulateCollect {
    reader: Arc<PositionReader>,
}

impl SimulateCollect {
    #[must_use]
    pub fn new(reader: Arc<PositionReader>) -> Self {
        Self { reader }
    }

    async fn simulate(&self, token_id: U256) -> Result<RawFees, FeeError> {
        let owner = self.reader.read_owner(token_id).await?;
        self.reader.simulate_collect(token_id, owner).await
    }
}

#[async_trait]
impl FeeStrategy for SimulateCollect {
    fn source(&self) -> FeeSource {
        FeeSource::Simulate
    }

    async fn resolve(&self, position: &PositionRecord) -> Result<Option<RawFees>, FeeError> {
        match self.simulate(position.token_id).await {
            Ok(fees) => Ok(Some(fees)),
            Err(e) => {
                tracing::warn!(
                    position_id = %position.token_id,
                    error = %e,
                    "collect simulation failed, falling back"
                );
                Ok(None)
            }
        }
    }
}

/// Reports the stored `tokensOwed` counters of the position record.
///
/// Always available once the record is read, but only as fresh as the position's last
/// on-chain interaction.
#[derive(Debug, Default)]
pub struct StoredTokensOwed;

#[async_trait]
impl FeeStrategy for StoredTokensOwed {
    fn source(&self) -> FeeSource {
        FeeSource::FallbackRead
    }

    async fn resolve(&self, position: &PositionRecord) -> Result<Option<RawFees>, FeeError> {
        Ok(Some(RawFees {
            amount0: U256::from(position.tokens_owed0),
            amount1: U256::from(position.tokens_owed1),
        }))
    }
}
