use super::util::{RetryPolicy, with_retry};
use crate::core::metadata::{AssetMetadata, MetadataProvider};
use crate::core::price::{PriceProvider, PriceQuote};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tracing::{debug, error, instrument};

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
struct Erc20AssetResponse {
    address: String,
    decimals: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceInfoResponse {
    unit_price: serde_json::Number,
}

/// Metadata and price lookups against the fun.xyz asset API.
pub struct FunkitProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl FunkitProvider {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("quotecast/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Requesting {}", url);

        let response = with_retry(
            || {
                let mut request = self.client.get(&url);
                if let Some(key) = &self.api_key {
                    request = request.header(API_KEY_HEADER, key);
                }
                request.send()
            },
            self.retry,
        )
        .await
        .with_context(|| format!("Request failed: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP error: {} for {}", status, endpoint));
        }

        let text = response
            .text()
            .await
            .context("Failed to get response text")?;

        serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse asset API response");
            anyhow!("Failed to parse JSON response for {}: {}", endpoint, e)
        })
    }
}

fn parse_unit_price(number: &serde_json::Number) -> Result<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .with_context(|| format!("Invalid unit price: {text}"))
}

#[async_trait]
impl MetadataProvider for FunkitProvider {
    #[instrument(name = "FunkitMetadataFetch", skip(self))]
    async fn fetch_metadata(&self, chain_id: &str, symbol: &str) -> Result<AssetMetadata> {
        let endpoint = format!("/asset/erc20/{chain_id}/{symbol}");
        let asset: Erc20AssetResponse = self.get_json(&endpoint).await?;

        Ok(AssetMetadata {
            symbol: symbol.to_string(),
            chain_id: chain_id.to_string(),
            address: asset.address,
            decimals: asset.decimals,
        })
    }
}

#[async_trait]
impl PriceProvider for FunkitProvider {
    #[instrument(name = "FunkitPriceFetch", skip(self))]
    async fn fetch_price(&self, chain_id: &str, address: &str) -> Result<PriceQuote> {
        let endpoint = format!("/asset/erc20/price/{chain_id}/{address}");
        let info: PriceInfoResponse = self.get_json(&endpoint).await?;

        Ok(PriceQuote {
            unit_price: parse_unit_price(&info.unit_price)?,
            fetched_at: chrono::Utc::now(),
        })
    }
}
