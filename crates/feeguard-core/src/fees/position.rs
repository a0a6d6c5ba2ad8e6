use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    fees::{
        abi::{collectCall, ownerOfCall, positionsCall, CollectParams},
        FeeError,
    },
    upstream::{CallRequest, RetryError, RetryExecutor},
};

const BLOCK_TAG: &str = "latest";

/// On-chain accounting of one liquidity position, as returned by `positions(tokenId)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionRecord {
    pub token_id: U256,
    pub token0: Address,
    pub token1: Address,
    pub liquidity: u128,
    /// Fees credited to the position at its last interaction; lags live fee growth.
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl PositionRecord {
    /// No liquidity and nothing owed: fees are zero without further reads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed0 == 0 && self.tokens_owed1 == 0
    }
}

/// Raw fee amounts in token base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFees {
    pub amount0: U256,
    pub amount1: U256,
}

impl RawFees {
    pub const ZERO: Self = Self { amount0: U256::ZERO, amount1: U256::ZERO };
}

/// Issues the position manager reads through the retry executor.
pub struct PositionReader {
    executor: Arc<RetryExecutor>,
    position_manager: Address,
}

impl PositionReader {
    #[must_use]
    pub fn new(executor: Arc<RetryExecutor>, position_manager: Address) -> Self {
        Self { executor, position_manager }
    }

    #[must_use]
    pub fn position_manager(&self) -> Address {
        self.position_manager
    }

    async fn call(&self, from: Option<Address>, data: Vec<u8>) -> Result<Bytes, RetryError> {
        let request = CallRequest { from, to: self.position_manager, data: data.into() };
        self.executor
            .execute_with_retry(|client| {
                let request = request.clone();
                async move { client.eth_call(&request, BLOCK_TAG).await }
            })
            .await
    }

    /// Reads `positions(tokenId)`.
    ///
    /// # Errors
    ///
    /// - [`FeeError::PositionNotFound`] if the call reverts (the token was never minted or
    ///   has been burned)
    /// - [`FeeError::Rpc`] if the read could not be completed
    /// - [`FeeError::Decode`] if the return data is malformed
    pub async fn read_position(&self, token_id: U256) -> Result<PositionRecord, FeeError> {
        let data = positionsCall { tokenId: token_id }.abi_encode();
        let raw = self.call(None, data).await.map_err(|e| match e {
            RetryError::Reverted(_) => FeeError::PositionNotFound(token_id.to_string()),
            other => FeeError::Rpc(other),
        })?;

        let decoded = positionsCall::abi_decode_returns(&raw, true)
            .map_err(|e| FeeError::Decode { call: "positions", message: e.to_string() })?;

        Ok(PositionRecord {
            token_id,
            token0: decoded.token0,
            token1: decoded.token1,
            liquidity: decoded.liquidity,
            tokens_owed0: decoded.tokensOwed0,
            tokens_owed1: decoded.tokensOwed1,
        })
    }

    /// Reads `ownerOf(tokenId)`.
    ///
    /// # Errors
    ///
    /// [`FeeError::Rpc`] or [`FeeError::Decode`].
    pub async fn read_owner(&self, token_id: U256) -> Result<Address, FeeError> {
        let data = ownerOfCall { tokenId: token_id }.abi_encode();
        let raw = self.call(None, data).await?;

        let decoded = ownerOfCall::abi_decode_returns(&raw, true)
            .map_err(|e| FeeError::Decode { call: "ownerOf", message: e.to_string() })?;
        Ok(decoded.owner)
    }

    /// Simulates `collect` with maximal amounts, sent from and paid to `owner`.
    ///
    /// Nothing is signed or broadcast; the amounts are what a real collect would transfer
    /// at the current block, including fee growth not yet credited to `tokensOwed`.
    ///
    /// # Errors
    ///
    /// [`FeeError::Rpc`] (including reverts) or [`FeeError::Decode`].
    pub async fn simulate_collect(
        &self,
        token_id: U256,
        owner: Address,
    ) -> Result<RawFees, FeeError> {
        let data = collectCall {
            params: CollectParams {
                tokenId: token_id,
                recipient: owner,
                amount0Max: u128::MAX,
                amount1Max: u128::MAX,
            },
        }
        .abi_encode();
        let raw = self.call(Some(owner), data).await?;

        let decoded = collectCall::abi_decode_returns(&raw, true)
            .map_err(|e| FeeError::Decode { call: "collect", message: e.to_string() })?;
        Ok(RawFees { amount0: decoded.amount0, amount1: decoded.amount1 })
    }
}
