use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use url::Url;

use crate::upstream::{HttpClient, UpstreamError};

/// Failure of a single price fetch. Never escapes [`crate::pricing::PriceOracleCache`].
#[derive(Error, Debug)]
pub enum PriceError {
    #[error("no price feed configured for {0}")]
    UnknownSymbol(String),

    #[error("price feed request failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("price feed returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("price feed has no usd price for {0}")]
    MissingPrice(String),
}

/// External source of USD prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches the current USD price of `symbol`.
    ///
    /// # Errors
    ///
    /// Any failure to obtain a usable price.
    async fn fetch_usd(&self, symbol: &str) -> Result<f64, PriceError>;
}

/// Simple-price HTTP feed: `GET {base}/simple/price?ids={id}&vs_currencies=usd`, answered
/// with `{"<id>": {"usd": <number>}}`.
pub struct HttpPriceSource {
    http_client: Arc<HttpClient>,
    base_url: Url,
    /// Upper-case symbol to feed id, e.g. `WETH` to `weth`.
    feed_ids: HashMap<String, String>,
    timeout: Duration,
}

impl HttpPriceSource {
    #[must_use]
    pub fn new(
        http_client: Arc<HttpClient>,
        base_url: Url,
        feed_ids: HashMap<String, String>,
        timeout: Duration,
    ) -> Self {
        let feed_ids =
            feed_ids.into_iter().map(|(symbol, id)| (symbol.to_uppercase(), id)).collect();
        Self { http_client, base_url, feed_ids, timeout }
    }

    fn price_url(&self, feed_id: &str) -> Result<Url, PriceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                PriceError::InvalidResponse("price feed base url cannot have a path".into())
            })?
            .pop_if_empty()
            .extend(["simple", "price"]);
        url.query_pairs_mut().append_pair("ids", feed_id).append_pair("vs_currencies", "usd");
        Ok(url)
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch_usd(&self, symbol: &str) -> Result<f64, PriceError> {
        let feed_id = self
            .feed_ids
            .get(&symbol.to_uppercase())
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.to_string()))?;

        let url = self.price_url(feed_id)?;
        let body = self.http_client.get(url.as_str(), self.timeout).await?;

        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| PriceError::InvalidResponse(format!("body is not json: {e}")))?;

        let price = value
            .get(feed_id.as_str())
            .and_then(|entry| entry.get("usd"))
            .and_then(Value::as_f64)
            .ok_or_else(|| PriceError::MissingPrice(symbol.to_string()))?;

        if !price.is_finite() || price < 0.0 {
            return Err(PriceError::InvalidResponse(format!("price {price} for {symbol}")));
        }

        Ok(price)
    }
}
