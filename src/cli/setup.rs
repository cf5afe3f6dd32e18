use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"---
# Example configuration file for quotecast

# Tokens offered for conversion. Remove this section to use the built-in list.
assets:
  - symbol: "USDC"
    name: "USD Coin"
    chain_id: "1"
  - symbol: "USDT"
    name: "Tether"
    chain_id: "137"
  - symbol: "ETH"
    name: "Ethereum"
    chain_id: "8453"
  - symbol: "WBTC"
    name: "Wrapped Bitcoin"
    chain_id: "1"

providers:
  funkit:
    base_url: "https://api.fun.xyz/v1"
    # api_key: "<your key>"

cache:
  # Token metadata rarely changes.
  metadata_stale_secs: 600
  # Prices are refetched on every commit while the last one stays on screen.
  price_stale_secs: 0

debounce_ms: 400
"#;

/// Creates a default configuration file at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

/// Creates a default configuration file at the specified path
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
