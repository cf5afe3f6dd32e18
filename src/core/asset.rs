//! Asset identity and catalog abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A convertible unit identified by its symbol and the chain it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub chain_id: String,
}

impl Asset {
    pub fn new(symbol: &str, name: &str, chain_id: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            chain_id: chain_id.to_string(),
        }
    }

    /// Composite identity used for cache entries and display labels.
    pub fn key(&self) -> AssetKey {
        AssetKey {
            symbol: self.symbol.clone(),
            chain_id: self.chain_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    pub symbol: String,
    pub chain_id: String,
}

impl Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.symbol, self.chain_id)
    }
}

/// Finds an asset by symbol (case-insensitive), optionally pinned to a chain.
pub fn find_asset<'a>(assets: &'a [Asset], symbol: &str, chain_id: Option<&str>) -> Option<&'a Asset> {
    assets.iter().find(|asset| {
        asset.symbol.eq_ignore_ascii_case(symbol)
            && chain_id.is_none_or(|chain| asset.chain_id == chain)
    })
}

#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn fetch_assets(&self) -> Result<Vec<Asset>>;
}
