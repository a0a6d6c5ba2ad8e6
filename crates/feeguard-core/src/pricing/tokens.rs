use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A token the service knows how to price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Price-feed symbol, e.g. `WETH`. Stored upper-case.
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

/// Lookup of known tokens by contract address and by symbol.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_address: HashMap<Address, TokenInfo>,
}

impl TokenRegistry {
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = TokenInfo>) -> Self {
        let by_address = tokens
            .into_iter()
            .map(|mut token| {
                token.symbol = token.symbol.to_uppercase();
                (token.address, token)
            })
            .collect();
        Self { by_address }
    }

    #[must_use]
    pub fn by_address(&self, address: &Address) -> Option<&TokenInfo> {
        self.by_address.get(address)
    }

    #[must_use]
    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.by_address.values().find(|token| token.symbol.eq_ignore_ascii_case(symbol))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
