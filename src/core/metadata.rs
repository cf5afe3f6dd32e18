use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// On-chain identity of an asset, needed before it can be priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub symbol: String,
    pub chain_id: String,
    pub address: String,
    pub decimals: u32,
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_metadata(&self, chain_id: &str, symbol: &str) -> anyhow::Result<AssetMetadata>;
}
