//! Core quote pipeline: assets, caches, resolvers and the conversion session

pub mod asset;
pub mod cache;
pub mod config;
pub mod convert;
pub mod debounce;
pub mod decimal;
pub mod error;
pub mod log;
pub mod metadata;
#[cfg(test)]
pub(crate) mod mock;
pub mod price;
pub mod quote;

// Re-export main types for cleaner imports
pub use asset::{Asset, AssetCatalog, AssetKey};
pub use convert::{ConversionView, ConvertSession, LegView, Update};
pub use error::QuoteError;
pub use metadata::{AssetMetadata, MetadataProvider};
pub use price::{PriceProvider, PriceQuote};
pub use quote::{CachePolicy, Leg, QueryState, QuoteResolver, QuoteServices, QuoteSnapshot};
