//! Per-leg, two-stage quote resolution: asset metadata first, then its price.

use crate::core::asset::{Asset, AssetKey};
use crate::core::cache::QueryCache;
use crate::core::error::QuoteError;
use crate::core::metadata::{AssetMetadata, MetadataProvider};
use crate::core::price::{PriceProvider, PriceQuote};
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

/// One side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leg {
    Sell,
    Buy,
}

impl Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Leg::Sell => "sell",
                Leg::Buy => "buy",
            }
        )
    }
}

/// Lifecycle of a single cached lookup as seen by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Idle,
    Pending,
    /// A refresh is running; the last good value stays visible.
    Refreshing(T),
    Success(T),
    Error(QuoteError),
}

impl<T> QueryState<T> {
    fn loading(previous: Option<T>) -> Self {
        match previous {
            Some(value) => QueryState::Refreshing(value),
            None => QueryState::Pending,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            QueryState::Refreshing(value) | QueryState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, QueryState::Pending | QueryState::Refreshing(_))
    }

    pub fn error(&self) -> Option<&QuoteError> {
        match self {
            QueryState::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// What a resolver currently shows for its leg.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub asset: Option<AssetKey>,
    pub metadata: QueryState<AssetMetadata>,
    pub price: QueryState<PriceQuote>,
}

impl QuoteSnapshot {
    pub fn idle() -> Self {
        Self {
            asset: None,
            metadata: QueryState::Idle,
            price: QueryState::Idle,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.metadata.is_fetching() || self.price.is_fetching()
    }
}

/// Staleness windows for the two lookup stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub metadata_stale_time: Duration,
    pub price_stale_time: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            metadata_stale_time: Duration::from_secs(10 * 60),
            price_stale_time: Duration::ZERO,
        }
    }
}

/// Providers and caches shared by every resolver of a session.
#[derive(Clone)]
pub struct QuoteServices {
    pub metadata_provider: Arc<dyn MetadataProvider>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub metadata_cache: Arc<QueryCache<AssetKey, AssetMetadata>>,
    pub price_cache: Arc<QueryCache<AssetKey, PriceQuote>>,
    pub policy: CachePolicy,
}

impl QuoteServices {
    pub fn new(
        metadata_provider: Arc<dyn MetadataProvider>,
        price_provider: Arc<dyn PriceProvider>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            metadata_provider,
            price_provider,
            metadata_cache: Arc::new(QueryCache::new()),
            price_cache: Arc::new(QueryCache::new()),
            policy,
        }
    }
}

/// Current request generation plus the published snapshot. Updates are only
/// applied while their generation is still the current one.
struct Published {
    generation: Mutex<u64>,
    tx: watch::Sender<QuoteSnapshot>,
}

impl Published {
    fn restart(&self, snapshot: QuoteSnapshot) -> u64 {
        let mut generation = self
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        self.tx.send_replace(snapshot);
        *generation
    }

    fn apply(&self, generation: u64, update: impl FnOnce(&mut QuoteSnapshot)) -> bool {
        let current = self
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            return false;
        }
        self.tx.send_modify(update);
        true
    }
}

pub struct QuoteResolver {
    leg: Leg,
    services: QuoteServices,
    published: Arc<Published>,
    pipeline: Option<JoinHandle<()>>,
}

impl QuoteResolver {
    pub fn new(leg: Leg, services: QuoteServices) -> Self {
        let (tx, _) = watch::channel(QuoteSnapshot::idle());
        Self {
            leg,
            services,
            published: Arc::new(Published {
                generation: Mutex::new(0),
                tx,
            }),
            pipeline: None,
        }
    }

    pub fn snapshot(&self) -> QuoteSnapshot {
        self.published.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteSnapshot> {
        self.published.tx.subscribe()
    }

    /// Starts a resolution cycle for `asset`, superseding any earlier one.
    ///
    /// The new snapshot is published before this returns: cached values for
    /// the asset stay visible while they are refreshed, otherwise the stages
    /// report `Pending`. Nothing from a previously requested asset survives.
    pub fn resolve(&mut self, asset: Option<&Asset>, committed_amount: Option<&str>) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.abort();
        }

        let Some(asset) = asset else {
            debug!(leg = %self.leg, "No asset selected, resolver idle");
            self.published.restart(QuoteSnapshot::idle());
            return;
        };

        let key = asset.key();
        let policy = self.services.policy;
        let metadata = match self
            .services
            .metadata_cache
            .get_fresh(&key, policy.metadata_stale_time)
        {
            Some(fresh) => QueryState::Success(fresh),
            None => QueryState::loading(self.services.metadata_cache.get(&key)),
        };
        let price = QueryState::loading(self.services.price_cache.get(&key));

        debug!(leg = %self.leg, asset = %key, amount = ?committed_amount, "Resolving quote");
        let generation = self.published.restart(QuoteSnapshot {
            asset: Some(key),
            metadata,
            price,
        });

        self.pipeline = Some(tokio::spawn(run_pipeline(
            self.leg,
            self.services.clone(),
            Arc::clone(&self.published),
            generation,
            asset.clone(),
        )));
    }
}

impl Drop for QuoteResolver {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.abort();
        }
    }
}

#[instrument(name = "QuotePipeline", skip(services, published, asset), fields(asset_key = %asset.key()))]
async fn run_pipeline(
    leg: Leg,
    services: QuoteServices,
    published: Arc<Published>,
    generation: u64,
    asset: Asset,
) {
    let key = asset.key();

    let metadata = {
        let provider = Arc::clone(&services.metadata_provider);
        let asset = asset.clone();
        services
            .metadata_cache
            .get_or_fetch(key.clone(), services.policy.metadata_stale_time, move || async move {
                provider.fetch_metadata(&asset.chain_id, &asset.symbol).await
            })
            .await
    };

    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(e) => {
            let error = QuoteError::MetadataResolutionFailed {
                asset: key.clone(),
                reason: e.to_string(),
            };
            debug!("{error}");
            if !published.apply(generation, |s| {
                s.metadata = QueryState::Error(error);
                s.price = QueryState::Idle;
            }) {
                debug!("Discarding metadata failure for superseded request");
            }
            return;
        }
    };

    let address = metadata.address.clone();
    if !published.apply(generation, |s| s.metadata = QueryState::Success(metadata)) {
        debug!("Request superseded after metadata stage, skipping price");
        return;
    }

    let price = {
        let provider = Arc::clone(&services.price_provider);
        let chain_id = asset.chain_id.clone();
        services
            .price_cache
            .get_or_fetch(key.clone(), services.policy.price_stale_time, move || async move {
                provider.fetch_price(&chain_id, &address).await
            })
            .await
    };

    let applied = match price {
        Ok(quote) => {
            debug!(unit_price = %quote.unit_price, "Price resolved");
            published.apply(generation, |s| s.price = QueryState::Success(quote))
        }
        Err(e) => {
            let error = QuoteError::PriceResolutionFailed {
                asset: key.clone(),
                reason: e.to_string(),
            };
            debug!("{error}");
            published.apply(generation, |s| s.price = QueryState::Error(error))
        }
    };
    if !applied {
        debug!("Discarding price result for superseded request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock::MockMarket;
    use rust_decimal::Decimal;

    async fn settled(rx: &mut watch::Receiver<QuoteSnapshot>) -> QuoteSnapshot {
        rx.wait_for(|s| !s.is_fetching()).await.unwrap().clone()
    }

    fn resolver_for(market: &Arc<MockMarket>, leg: Leg) -> QuoteResolver {
        QuoteResolver::new(leg, market.services(CachePolicy::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_asset_is_idle() {
        let market = Arc::new(MockMarket::new());
        let mut resolver = resolver_for(&market, Leg::Sell);

        resolver.resolve(None, Some("10"));

        assert_eq!(resolver.snapshot(), QuoteSnapshot::idle());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(market.metadata_calls(), 0);
        assert_eq!(market.price_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_metadata_then_price() {
        let market = Arc::new(MockMarket::new().with_price("USDC", "0.5"));
        let mut resolver = resolver_for(&market, Leg::Sell);
        let mut rx = resolver.subscribe();
        let usdc = Asset::new("USDC", "USD Coin", "1");

        resolver.resolve(Some(&usdc), None);
        let initial = resolver.snapshot();
        assert!(initial.metadata.is_pending());
        assert!(initial.price.is_pending());

        let snapshot = settled(&mut rx).await;
        assert_eq!(snapshot.asset, Some(usdc.key()));
        assert_eq!(snapshot.metadata.value().unwrap().address, "0xusdc");
        assert_eq!(
            snapshot.price.value().unwrap().unit_price,
            Decimal::new(5, 1)
        );
        assert!(matches!(snapshot.price, QueryState::Success(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_cached_within_window() {
        let market = Arc::new(MockMarket::new().with_price("USDC", "1"));
        let mut resolver = resolver_for(&market, Leg::Sell);
        let mut rx = resolver.subscribe();
        let usdc = Asset::new("USDC", "USD Coin", "1");

        resolver.resolve(Some(&usdc), Some("1"));
        settled(&mut rx).await;
        resolver.resolve(Some(&usdc), Some("2"));
        assert!(matches!(resolver.snapshot().metadata, QueryState::Success(_)));
        settled(&mut rx).await;

        assert_eq!(market.metadata_calls(), 1);
        assert_eq!(market.price_calls(), 2);

        tokio::time::advance(Duration::from_secs(601)).await;
        resolver.resolve(Some(&usdc), Some("3"));
        settled(&mut rx).await;
        assert_eq!(market.metadata_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_refresh_keeps_previous_value_visible() {
        let market = Arc::new(MockMarket::new().with_price("WBTC", "60000"));
        let mut resolver = resolver_for(&market, Leg::Buy);
        let mut rx = resolver.subscribe();
        let wbtc = Asset::new("WBTC", "Wrapped Bitcoin", "1");

        resolver.resolve(Some(&wbtc), Some("1"));
        settled(&mut rx).await;

        market.set_price("WBTC", "65000");
        resolver.resolve(Some(&wbtc), Some("1"));
        match resolver.snapshot().price {
            QueryState::Refreshing(previous) => {
                assert_eq!(previous.unit_price, Decimal::from(60000))
            }
            other => panic!("Expected stale value while refreshing, got {other:?}"),
        }

        let snapshot = settled(&mut rx).await;
        assert_eq!(
            snapshot.price.value().unwrap().unit_price,
            Decimal::from(65000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_failure_short_circuits_price() {
        let market = Arc::new(MockMarket::new().with_failing_metadata("FAIL"));
        let mut resolver = resolver_for(&market, Leg::Sell);
        let mut rx = resolver.subscribe();
        let fail = Asset::new("FAIL", "Fail", "1");

        resolver.resolve(Some(&fail), Some("1"));
        let snapshot = settled(&mut rx).await;

        assert!(matches!(
            snapshot.metadata.error(),
            Some(QuoteError::MetadataResolutionFailed { .. })
        ));
        assert_eq!(snapshot.price, QueryState::Idle);
        assert_eq!(market.price_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_failure_keeps_metadata() {
        let market = Arc::new(MockMarket::new().with_failing_price("ETH"));
        let mut resolver = resolver_for(&market, Leg::Sell);
        let mut rx = resolver.subscribe();
        let eth = Asset::new("ETH", "Ethereum", "8453");

        resolver.resolve(Some(&eth), Some("1"));
        let snapshot = settled(&mut rx).await;

        assert!(matches!(snapshot.metadata, QueryState::Success(_)));
        let error = snapshot.price.error().unwrap();
        assert!(matches!(error, QuoteError::PriceResolutionFailed { .. }));
        assert!(error.to_string().contains("ETH-8453"));
        assert!(
            resolver
                .services
                .metadata_cache
                .get(&eth.key())
                .is_some()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_assets_discards_stale_result() {
        let market = Arc::new(
            MockMarket::new()
                .with_price("ETH", "3000")
                .with_price("USDC", "1")
                .with_delay("ETH", Duration::from_millis(500)),
        );
        let mut resolver = resolver_for(&market, Leg::Sell);
        let eth = Asset::new("ETH", "Ethereum", "8453");
        let usdc = Asset::new("USDC", "USD Coin", "1");

        resolver.resolve(Some(&eth), Some("1"));
        // Metadata for ETH lands at 500ms, its price fetch is then in flight.
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(resolver.services.price_cache.is_fetching(&eth.key()));

        resolver.resolve(Some(&usdc), Some("1"));
        tokio::time::sleep(Duration::from_secs(2)).await;

        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.asset, Some(usdc.key()));
        assert_eq!(snapshot.price.value().unwrap().unit_price, Decimal::ONE);
        // The abandoned fetch still completed into the shared cache.
        assert_eq!(
            resolver.services.price_cache.get(&eth.key()).unwrap().unit_price,
            Decimal::from(3000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_legs_share_in_flight_requests() {
        let market = Arc::new(
            MockMarket::new()
                .with_price("USDT", "1")
                .with_delay("USDT", Duration::from_millis(100)),
        );
        let services = market.services(CachePolicy::default());
        let mut sell = QuoteResolver::new(Leg::Sell, services.clone());
        let mut buy = QuoteResolver::new(Leg::Buy, services);
        let usdt = Asset::new("USDT", "Tether", "137");

        sell.resolve(Some(&usdt), Some("5"));
        buy.resolve(Some(&usdt), Some("5"));
        let (mut sell_rx, mut buy_rx) = (sell.subscribe(), buy.subscribe());
        settled(&mut sell_rx).await;
        settled(&mut buy_rx).await;

        assert_eq!(market.metadata_calls(), 1);
        assert_eq!(market.price_calls(), 1);
    }
}
