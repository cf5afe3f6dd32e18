//! Failures surfaced by the quote pipeline.

use crate::core::asset::AssetKey;
use thiserror::Error;

/// Copies are kept in published quote snapshots and in the catalog state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Asset catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Failed to resolve metadata for {asset}: {reason}")]
    MetadataResolutionFailed { asset: AssetKey, reason: String },

    #[error("Failed to resolve price for {asset}: {reason}")]
    PriceResolutionFailed { asset: AssetKey, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_asset() {
        let asset = AssetKey {
            symbol: "ETH".to_string(),
            chain_id: "8453".to_string(),
        };
        let error = QuoteError::PriceResolutionFailed {
            asset: asset.clone(),
            reason: "HTTP error: 503".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Failed to resolve price for ETH-8453: HTTP error: 503"
        );
        assert_eq!(error.clone(), error);
        assert_eq!(
            QuoteError::MetadataResolutionFailed {
                asset,
                reason: "not found".to_string()
            }
            .to_string(),
            "Failed to resolve metadata for ETH-8453: not found"
        );
    }
}
