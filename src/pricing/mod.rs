//! USD price lookup for fee tokens.
//!
//! Prices are best-effort: a failed lookup degrades the report to unpriced legs and is never
//! fatal. Lookups within one run go through a [`PriceCache`] so each symbol is fetched once.

use crate::domain::Decimal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub mod http;
pub mod mock;

pub use http::HttpPriceSource;
pub use mock::StaticPriceSource;

/// Where to fetch one symbol's USD price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEndpoint {
    /// GET endpoint returning a JSON body.
    pub url: String,
    /// Dot-separated path to the price inside the body, e.g. `ethereum.usd`.
    pub json_path: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error {status} from {url}")]
    Http { status: u16, url: String },
    #[error("no price at '{path}' in response")]
    MissingField { path: String },
    #[error("unparseable price: {0}")]
    Parse(String),
}

/// A source of USD prices keyed by token symbol.
#[async_trait]
pub trait PriceSource: Send + Sync + fmt::Debug {
    /// USD price of one whole `symbol` token, or `None` if the symbol is not configured.
    async fn usd_price(&self, symbol: &str) -> Result<Option<Decimal>, PriceError>;
}

/// Per-run memo of price lookups.
///
/// Successful lookups and unknown symbols are remembered; failures are not, so a later
/// pool may retry a symbol whose earlier fetch failed.
#[derive(Debug)]
pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    prices: HashMap<String, Option<Decimal>>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self {
            source,
            prices: HashMap::new(),
        }
    }

    /// USD price of `symbol`, or `None` when unknown or unavailable.
    pub async fn usd_price(&mut self, symbol: &str) -> Option<Decimal> {
        if let Some(cached) = self.prices.get(symbol) {
            return *cached;
        }
        match self.source.usd_price(symbol).await {
            Ok(price) => {
                debug!(symbol, price = ?price.map(|p| p.to_string()), "Fetched USD price");
                self.prices.insert(symbol.to_string(), price);
                price
            }
            Err(e) => {
                warn!(symbol, error = %e, "Error fetching price, leaving token unpriced");
                None
            }
        }
    }

    /// Number of symbols with a remembered outcome.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Follow a dot-separated `path` into `body` and read a price from the value there.
///
/// Numbers and numeric strings are accepted. Array elements are addressed by index.
pub fn extract_price(body: &serde_json::Value, path: &str) -> Result<Decimal, PriceError> {
    let missing = || PriceError::MissingField {
        path: path.to_string(),
    };

    let mut node = body;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        node = match node {
            serde_json::Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(missing)?,
            other => other.get(segment).ok_or_else(missing)?,
        };
    }

    let text = match node {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return Err(missing()),
    };
    parse_price(&text)
}

fn parse_price(text: &str) -> Result<Decimal, PriceError> {
    Decimal::from_str_canonical(text)
        .or_else(|_| rust_decimal::Decimal::from_scientific(text).map(Decimal::new))
        .map_err(|e| PriceError::Parse(format!("'{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_extract_nested_number() {
        let body = json!({"ethereum": {"usd": 3120.55}});
        let price = extract_price(&body, "ethereum.usd").unwrap();
        assert_eq!(price.to_string(), "3120.55");
    }

    #[test]
    fn test_extract_string_and_array() {
        let body = json!({"data": [{"price": "0.9998"}]});
        let price = extract_price(&body, "data.0.price").unwrap();
        assert_eq!(price.to_string(), "0.9998");
    }

    #[test]
    fn test_extract_scientific_notation() {
        let body = json!({"p": "1.5e-5"});
        let price = extract_price(&body, "p").unwrap();
        assert_eq!(price.to_string(), "0.000015");
    }

    #[test]
    fn test_extract_missing_path() {
        let body = json!({"ethereum": {"eur": 1}});
        let err = extract_price(&body, "ethereum.usd").unwrap_err();
        assert_eq!(
            err,
            PriceError::MissingField {
                path: "ethereum.usd".to_string()
            }
        );
    }

    #[test]
    fn test_extract_rejects_non_numeric() {
        let body = json!({"p": "n/a"});
        assert!(matches!(
            extract_price(&body, "p").unwrap_err(),
            PriceError::Parse(_)
        ));
        let body = json!({"p": true});
        assert!(extract_price(&body, "p").is_err());
    }

    #[tokio::test]
    async fn test_cache_fetches_each_symbol_once() {
        let source = StaticPriceSource::new()
            .with_price("WETH", Decimal::from_str_canonical("2000").unwrap());
        let calls = source.calls();
        let mut cache = PriceCache::new(Arc::new(source));

        assert_eq!(cache.usd_price("WETH").await.unwrap().to_string(), "2000");
        assert_eq!(cache.usd_price("WETH").await.unwrap().to_string(), "2000");
        assert_eq!(cache.usd_price("DOGE").await, None);
        assert_eq!(cache.usd_price("DOGE").await, None);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_remember_failures() {
        let source = StaticPriceSource::new().failing("USDC");
        let calls = source.calls();
        let mut cache = PriceCache::new(Arc::new(source));

        assert_eq!(cache.usd_price("USDC").await, None);
        assert_eq!(cache.usd_price("USDC").await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
