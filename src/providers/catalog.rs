use crate::core::asset::{Asset, AssetCatalog};
use crate::core::error::QuoteError;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

/// Fixed asset list, either built in or taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    assets: Vec<Asset>,
}

impl StaticCatalog {
    /// Rejects lists where two assets share a symbol and chain.
    pub fn new(assets: Vec<Asset>) -> Result<Self> {
        let mut seen = HashSet::new();
        for asset in &assets {
            if !seen.insert(asset.key()) {
                bail!("Duplicate asset in catalog: {}", asset.key());
            }
        }
        Ok(Self { assets })
    }

    pub fn builtin() -> Self {
        Self {
            assets: vec![
                Asset::new("USDC", "USD Coin", "1"),
                Asset::new("USDT", "Tether", "137"),
                Asset::new("ETH", "Ethereum", "8453"),
                Asset::new("WBTC", "Wrapped Bitcoin", "1"),
            ],
        }
    }
}

#[async_trait]
impl AssetCatalog for StaticCatalog {
    async fn fetch_assets(&self) -> Result<Vec<Asset>> {
        Ok(self.assets.clone())
    }
}

/// Load state of a catalog as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    NotLoaded,
    Loading,
    Loaded(Vec<Asset>),
    Failed(QuoteError),
}

/// Keeps the first successful snapshot for the rest of the session.
/// Failures are not cached, so the next load tries again.
pub struct CachingCatalog<T: AssetCatalog> {
    inner: T,
    state: Mutex<CatalogState>,
    load_lock: AsyncMutex<()>,
}

impl<T: AssetCatalog> CachingCatalog<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            state: Mutex::new(CatalogState::NotLoaded),
            load_lock: AsyncMutex::new(()),
        }
    }

    pub fn state(&self) -> CatalogState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, state: CatalogState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub async fn load(&self) -> Result<Vec<Asset>, QuoteError> {
        let _guard = self.load_lock.lock().await;
        if let CatalogState::Loaded(assets) = self.state() {
            debug!("Cache HIT for asset catalog");
            return Ok(assets);
        }

        debug!("Cache MISS for asset catalog");
        self.set_state(CatalogState::Loading);
        match self.inner.fetch_assets().await {
            Ok(assets) => {
                self.set_state(CatalogState::Loaded(assets.clone()));
                Ok(assets)
            }
            Err(e) => {
                let error = QuoteError::CatalogUnavailable(format!("{e:#}"));
                self.set_state(CatalogState::Failed(error.clone()));
                Err(error)
            }
        }
    }
}

#[async_trait]
impl<T: AssetCatalog> AssetCatalog for CachingCatalog<T> {
    async fn fetch_assets(&self) -> Result<Vec<Asset>> {
        Ok(self.load().await?)
    }
}
