//! Conversion session: debounced amount plus one quote resolver per leg.
//!
//! The entered amount is read as a value and expressed in each selected
//! asset's own units through that asset's unit price, so both legs are
//! computed independently from the same committed amount.

use crate::core::asset::Asset;
use crate::core::debounce::Debouncer;
use crate::core::decimal;
use crate::core::quote::{Leg, QuoteResolver, QuoteServices, QuoteSnapshot};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Presentation state of one leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegView {
    pub converted_amount: String,
    pub is_pending: bool,
    pub is_fetching: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionView {
    pub sell: LegView,
    pub buy: LegView,
}

/// Something that changed the session's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Committed(String),
    LegChanged(Leg),
}

/// Amount the session starts from; committed like any other edit.
pub const DEFAULT_AMOUNT: &str = "0.0";

pub struct ConvertSession {
    debouncer: Debouncer<String>,
    commits: mpsc::UnboundedReceiver<String>,
    committed: Option<String>,
    sell_asset: Option<Asset>,
    buy_asset: Option<Asset>,
    sell: QuoteResolver,
    buy: QuoteResolver,
    sell_updates: watch::Receiver<QuoteSnapshot>,
    buy_updates: watch::Receiver<QuoteSnapshot>,
}

impl ConvertSession {
    pub fn new(services: QuoteServices, debounce: Duration) -> Self {
        let (mut debouncer, commits) = Debouncer::new(debounce);
        debouncer.schedule(DEFAULT_AMOUNT.to_string());
        let sell = QuoteResolver::new(Leg::Sell, services.clone());
        let buy = QuoteResolver::new(Leg::Buy, services);
        let sell_updates = sell.subscribe();
        let buy_updates = buy.subscribe();

        Self {
            debouncer,
            commits,
            committed: None,
            sell_asset: None,
            buy_asset: None,
            sell,
            buy,
            sell_updates,
            buy_updates,
        }
    }

    /// Feeds a raw, possibly half-typed amount. It is committed once the
    /// debounce window passes without another edit.
    pub fn set_sell_amount(&mut self, raw: &str) {
        self.debouncer.schedule(raw.to_string());
    }

    /// Commits `amount` immediately, dropping any pending raw edit.
    pub fn commit_amount(&mut self, amount: &str) {
        self.debouncer.cancel();
        self.apply_commit(amount.to_string());
    }

    pub fn select_sell_asset(&mut self, asset: Option<Asset>) {
        if self.sell_asset == asset {
            return;
        }
        self.sell.resolve(asset.as_ref(), self.committed.as_deref());
        self.sell_asset = asset;
    }

    pub fn select_buy_asset(&mut self, asset: Option<Asset>) {
        if self.buy_asset == asset {
            return;
        }
        self.buy.resolve(asset.as_ref(), self.committed.as_deref());
        self.buy_asset = asset;
    }

    pub fn committed_amount(&self) -> Option<&str> {
        self.committed.as_deref()
    }

    pub fn sell_asset(&self) -> Option<&Asset> {
        self.sell_asset.as_ref()
    }

    pub fn buy_asset(&self) -> Option<&Asset> {
        self.buy_asset.as_ref()
    }

    /// True when no commit is waiting and neither leg is fetching.
    pub fn is_settled(&self) -> bool {
        !self.debouncer.is_pending()
            && self.commits.is_empty()
            && !self.sell.snapshot().is_fetching()
            && !self.buy.snapshot().is_fetching()
    }

    /// Waits for the next commit or leg state change and applies it.
    pub async fn next_update(&mut self) -> Option<Update> {
        let update = tokio::select! {
            Some(amount) = self.commits.recv() => Update::Committed(amount),
            Ok(()) = self.sell_updates.changed() => Update::LegChanged(Leg::Sell),
            Ok(()) = self.buy_updates.changed() => Update::LegChanged(Leg::Buy),
            else => return None,
        };

        if let Update::Committed(amount) = &update {
            self.apply_commit(amount.clone());
        }
        Some(update)
    }

    pub fn view(&self) -> ConversionView {
        let committed = self.committed.as_deref();
        ConversionView {
            sell: leg_view(committed, self.sell_asset.as_ref(), &self.sell.snapshot()),
            buy: leg_view(committed, self.buy_asset.as_ref(), &self.buy.snapshot()),
        }
    }

    fn apply_commit(&mut self, amount: String) {
        debug!(amount = %amount, "Committed amount");
        self.committed = Some(amount);
        let committed = self.committed.as_deref();
        if self.sell_asset.is_some() {
            self.sell.resolve(self.sell_asset.as_ref(), committed);
        }
        if self.buy_asset.is_some() {
            self.buy.resolve(self.buy_asset.as_ref(), committed);
        }
    }
}

fn leg_view(committed: Option<&str>, asset: Option<&Asset>, snapshot: &QuoteSnapshot) -> LegView {
    let enabled = committed.is_some_and(|amount| !amount.trim().is_empty()) && asset.is_some();

    // A snapshot for some other asset is never rendered as this leg's state.
    let idle = QuoteSnapshot::idle();
    let snapshot = if snapshot.asset == asset.map(Asset::key) {
        snapshot
    } else {
        &idle
    };

    let unit_price = snapshot.price.value().map(|quote| quote.unit_price);
    let decimals = snapshot.metadata.value().map_or(0, |metadata| metadata.decimals);

    LegView {
        converted_amount: decimal::convert(committed.unwrap_or_default(), unit_price, decimals, enabled),
        is_pending: enabled && (snapshot.metadata.is_pending() || snapshot.price.is_pending()),
        is_fetching: enabled && snapshot.is_fetching(),
        error: snapshot
            .metadata
            .error()
            .or_else(|| snapshot.price.error())
            .map(ToString::to_string),
    }
}
