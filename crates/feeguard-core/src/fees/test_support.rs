//! Scripted position manager for fee tests.

use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crate::{
    fees::{
        abi::{collectCall, ownerOfCall, positionsCall},
        position::{PositionReader, PositionRecord},
    },
    types::{EndpointConfig, JsonRpcRequest},
    upstream::{
        Endpoint, EndpointRegistry, RegistryConfig, RetryExecutor, RetryPolicy, RpcTransport,
        UpstreamError,
    },
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum MockFailure {
    Revert,
    RateLimited,
}

impl MockFailure {
    fn to_error(self) -> UpstreamError {
        match self {
            Self::Revert => {
                UpstreamError::RpcError(3, "execution reverted: Invalid token ID".into())
            }
            Self::RateLimited => UpstreamError::HttpError(429, "Too Many Requests".into()),
        }
    }
}

struct Inner {
    position: Mutex<Result<Vec<u8>, MockFailure>>,
    owner: Mutex<Result<Vec<u8>, MockFailure>>,
    collect: Mutex<Result<Vec<u8>, MockFailure>>,
    positions_calls: AtomicU32,
    owner_calls: AtomicU32,
    collect_calls: AtomicU32,
    last_collect_from: Mutex<Option<Address>>,
}

#[derive(Clone)]
pub(crate) struct MockChain {
    inner: Arc<Inner>,
}

fn word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

fn address_word(address: Address) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(address.as_slice());
    out
}

fn position_return(liquidity: u128, owed0: u128, owed1: u128) -> Vec<u8> {
    [
        word(U256::ZERO),
        address_word(Address::ZERO),
        address_word(MockChain::TOKEN0),
        address_word(MockChain::TOKEN1),
        word(U256::from(3000)),
        word(U256::ZERO),
        word(U256::ZERO),
        word(U256::from(liquidity)),
        word(U256::ZERO),
        word(U256::ZERO),
        word(U256::from(owed0)),
        word(U256::from(owed1)),
    ]
    .concat()
}

pub(crate) fn position_record(
    token_id: u64,
    liquidity: u128,
    owed0: u128,
    owed1: u128,
) -> PositionRecord {
    PositionRecord {
        token_id: U256::from(token_id),
        token0: MockChain::TOKEN0,
        token1: MockChain::TOKEN1,
        liquidity,
        tokens_owed0: owed0,
        tokens_owed1: owed1,
    }
}

impl MockChain {
    pub(crate) const TOKEN0: Address = Address::repeat_byte(0x01);
    pub(crate) const TOKEN1: Address = Address::repeat_byte(0x02);
    pub(crate) const OWNER: Address = Address::repeat_byte(0x0a);
    pub(crate) const POSITION_MANAGER: Address = Address::repeat_byte(0xc3);

    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                position: Mutex::new(Ok(position_return(1_000, 5, 6))),
                owner: Mutex::new(Ok(address_word(Self::OWNER).to_vec())),
                collect: Mutex::new(Ok([word(U256::from(50)), word(U256::from(60))].concat())),
                positions_calls: AtomicU32::new(0),
                owner_calls: AtomicU32::new(0),
                collect_calls: AtomicU32::new(0),
                last_collect_from: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn revert() -> MockFailure {
        MockFailure::Revert
    }

    pub(crate) fn rate_limited() -> MockFailure {
        MockFailure::RateLimited
    }

    pub(crate) fn with_position(self, liquidity: u128, owed0: u128, owed1: u128) -> Self {
        *self.inner.position.lock() = Ok(position_return(liquidity, owed0, owed1));
        self
    }

    pub(crate) fn with_position_failure(self, failure: MockFailure) -> Self {
        *self.inner.position.lock() = Err(failure);
        self
    }

    pub(crate) fn with_owner_failure(self, failure: MockFailure) -> Self {
        *self.inner.owner.lock() = Err(failure);
        self
    }

    pub(crate) fn with_collect(self, reply: Result<(u128, u128), MockFailure>) -> Self {
        *self.inner.collect.lock() =
            reply.map(|(a0, a1)| [word(U256::from(a0)), word(U256::from(a1))].concat());
        self
    }

    pub(crate) fn positions_calls(&self) -> u32 {
        self.inner.positions_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn owner_calls(&self) -> u32 {
        self.inner.owner_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn collect_calls(&self) -> u32 {
        self.inner.collect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_collect_from(&self) -> Option<Address> {
        *self.inner.last_collect_from.lock()
    }

    /// Three endpoints, default retry policy.
    pub(crate) fn executor(&self) -> Arc<RetryExecutor> {
        let configs = ["a", "b", "c"]
            .iter()
            .zip(1..)
            .map(|(name, priority)| EndpointConfig {
                name: Arc::from(*name),
                url: format!("https://{name}.example"),
                priority,
                timeout_seconds: 5,
            })
            .collect();
        let registry = Arc::new(EndpointRegistry::new(configs, RegistryConfig::default()).unwrap());
        Arc::new(RetryExecutor::new(registry, Arc::new(self.clone()), RetryPolicy::default()))
    }

    pub(crate) fn reader(&self) -> Arc<PositionReader> {
        Arc::new(PositionReader::new(self.executor(), Self::POSITION_MANAGER))
    }
}

#[async_trait]
impl RpcTransport for MockChain {
    async fn send(
        &self,
        _endpoint: &Endpoint,
        request: &JsonRpcRequest,
    ) -> Result<Value, UpstreamError> {
        let call = request
            .params
            .as_ref()
            .and_then(|params| params.get(0))
            .cloned()
            .ok_or_else(|| UpstreamError::InvalidRequest("missing call object".into()))?;

        assert_eq!(
            call["to"].as_str().and_then(|to| to.parse::<Address>().ok()),
            Some(Self::POSITION_MANAGER)
        );

        let data = call["data"]
            .as_str()
            .and_then(|data| hex::decode(data).ok())
            .ok_or_else(|| UpstreamError::InvalidRequest("missing call data".into()))?;
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| UpstreamError::InvalidRequest("short call data".into()))?;

        let reply = if selector == positionsCall::SELECTOR {
            self.inner.positions_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.position.lock().clone()
        } else if selector == ownerOfCall::SELECTOR {
            self.inner.owner_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.owner.lock().clone()
        } else if selector == collectCall::SELECTOR {
            self.inner.collect_calls.fetch_add(1, Ordering::SeqCst);
            *self.inner.last_collect_from.lock() =
                call["from"].as_str().and_then(|from| from.parse::<Address>().ok());
            self.inner.collect.lock().clone()
        } else {
            return Err(UpstreamError::RpcError(-32601, "unknown selector".into()));
        };

        reply
            .map(|bytes| Value::String(format!("0x{}", hex::encode(bytes))))
            .map_err(MockFailure::to_error)
    }
}
