//! Fixed price table for tests.

use super::{PriceError, PriceSource};
use crate::domain::Decimal;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Price source answering from an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    prices: HashMap<String, Decimal>,
    failing: HashSet<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price one whole `symbol` token at `usd`.
    pub fn with_price(mut self, symbol: &str, usd: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), usd);
        self
    }

    /// Make every lookup of `symbol` fail with a network error.
    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    /// Lookups served so far, shared across clones.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn usd_price(&self, symbol: &str) -> Result<Option<Decimal>, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(symbol) {
            return Err(PriceError::Network(format!("price feed down for {}", symbol)));
        }
        Ok(self.prices.get(symbol).copied())
    }
}
