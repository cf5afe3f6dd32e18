pub mod assets;
pub mod quote;
pub mod setup;
pub mod ui;
pub mod watch;

use crate::core::Asset;
use crate::core::asset::find_asset;
use anyhow::{Result, anyhow, bail};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest amount accepted on the command line.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Looks up an asset given as `SYMBOL` or `SYMBOL-CHAIN`.
pub fn resolve_asset(assets: &[Asset], query: &str) -> Result<Asset> {
    let pinned = query
        .rsplit_once('-')
        .and_then(|(symbol, chain_id)| find_asset(assets, symbol, Some(chain_id)));

    pinned
        .or_else(|| find_asset(assets, query, None))
        .cloned()
        .ok_or_else(|| {
            let available: Vec<String> = assets.iter().map(|a| a.key().to_string()).collect();
            anyhow!("Unknown asset: {} (available: {})", query, available.join(", "))
        })
}

/// Checks an amount given as a command argument: a positive decimal no
/// larger than [`MAX_AMOUNT`].
pub fn validate_amount(amount: &str) -> Result<()> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|_| anyhow!("Amount must be a positive number: {amount}"))?;
    if value <= Decimal::ZERO {
        bail!("Amount must be a positive number: {amount}");
    }
    if value > MAX_AMOUNT {
        bail!("Amount cannot exceed 1,000,000");
    }
    Ok(())
}
