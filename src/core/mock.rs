//! In-memory market used by pipeline tests.

use crate::core::metadata::{AssetMetadata, MetadataProvider};
use crate::core::price::{PriceProvider, PriceQuote};
use crate::core::quote::{CachePolicy, QuoteServices};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Addresses are `0x` followed by the lowercase symbol.
pub(crate) struct MockMarket {
    prices: Mutex<HashMap<String, Decimal>>,
    failing_metadata: HashSet<String>,
    failing_prices: HashSet<String>,
    delays: HashMap<String, Duration>,
    metadata_calls: AtomicUsize,
    price_calls: AtomicUsize,
}

impl MockMarket {
    pub(crate) fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
            failing_metadata: HashSet::new(),
            failing_prices: HashSet::new(),
            delays: HashMap::new(),
            metadata_calls: AtomicUsize::new(0),
            price_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_price(self, symbol: &str, price: &str) -> Self {
        self.set_price(symbol, price);
        self
    }

    pub(crate) fn with_failing_metadata(mut self, symbol: &str) -> Self {
        self.failing_metadata.insert(symbol.to_string());
        self
    }

    pub(crate) fn with_failing_price(mut self, symbol: &str) -> Self {
        self.failing_prices.insert(symbol.to_string());
        self
    }

    /// Applies to both the metadata and the price lookup of `symbol`.
    pub(crate) fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    pub(crate) fn set_price(&self, symbol: &str, price: &str) {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), Decimal::from_str(price).unwrap());
    }

    pub(crate) fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn services(self: &Arc<Self>, policy: CachePolicy) -> QuoteServices {
        QuoteServices::new(
            Arc::clone(self) as Arc<dyn MetadataProvider>,
            Arc::clone(self) as Arc<dyn PriceProvider>,
            policy,
        )
    }

    async fn delay_for(&self, symbol: &str) {
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl MetadataProvider for MockMarket {
    async fn fetch_metadata(&self, chain_id: &str, symbol: &str) -> Result<AssetMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.delay_for(symbol).await;
        if self.failing_metadata.contains(symbol) {
            return Err(anyhow!("Asset {symbol} not found on chain {chain_id}"));
        }
        Ok(AssetMetadata {
            symbol: symbol.to_string(),
            chain_id: chain_id.to_string(),
            address: format!("0x{}", symbol.to_lowercase()),
            decimals: 6,
        })
    }
}

#[async_trait]
impl PriceProvider for MockMarket {
    async fn fetch_price(&self, _chain_id: &str, address: &str) -> Result<PriceQuote> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        let symbol = address.trim_start_matches("0x").to_uppercase();
        self.delay_for(&symbol).await;
        if self.failing_prices.contains(&symbol) {
            return Err(anyhow!("Price feed unavailable for {address}"));
        }
        let unit_price = self
            .prices
            .lock()
            .unwrap()
            .get(&symbol)
            .copied()
            .ok_or_else(|| anyhow!("No price for {address}"))?;
        Ok(PriceQuote {
            unit_price,
            fetched_at: chrono::Utc::now(),
        })
    }
}
