use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::{AssetResolver, ExchangeInterface, MessageSink, PriceOracle};
use crate::core::types::{
    AssetMovement, BalanceMap, ExchangeQueryBalances, Location, MarginPosition, Timestamp, Trade,
};
use crate::exchanges::poloniex::rest::PoloniexRestClient;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod account;
pub mod history;

pub(crate) struct CachedBalances {
    fetched_at: Instant,
    balances: BalanceMap,
}

/// Poloniex connector composing the typed REST client with the asset,
/// price and message collaborators
pub struct PoloniexConnector<R: RestClient> {
    name: String,
    rest: PoloniexRestClient<R>,
    assets: Arc<dyn AssetResolver>,
    prices: Arc<dyn PriceOracle>,
    messages: Arc<dyn MessageSink>,
    balances: Mutex<Option<CachedBalances>>,
}

impl<R: RestClient> PoloniexConnector<R> {
    pub fn new(
        name: String,
        rest: PoloniexRestClient<R>,
        assets: Arc<dyn AssetResolver>,
        prices: Arc<dyn PriceOracle>,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            name,
            rest,
            assets,
            prices,
            messages,
            balances: Mutex::new(None),
        }
    }

    pub fn rest(&self) -> &PoloniexRestClient<R> {
        &self.rest
    }

    /// Replace the API key and/or secret
    ///
    /// Takes `&mut self`, so no query can be in flight while credentials
    /// change. Cached balances belong to the old account and are dropped.
    pub fn edit_credentials(&mut self, api_key: Option<String>, secret_key: Option<String>) -> bool {
        let changed = self.rest.edit_credentials(api_key, secret_key);
        if changed {
            *self.balances.get_mut() = None;
        }
        changed
    }

    pub(crate) fn send_unknown_asset_message(&self, identifier: &str, details: &str) {
        self.messages.add_warning(format!(
            "Found unknown {} asset {} in {}. Ignoring it.",
            Location::Poloniex, identifier, details
        ));
    }
}

#[async_trait]
impl<R: RestClient> ExchangeInterface for PoloniexConnector<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate_api_key(&self) -> Result<(bool, String), ExchangeError> {
        self.check_api_key().await
    }

    async fn query_balances(&self) -> ExchangeQueryBalances {
        self.cached_balances().await
    }

    async fn query_trades(
        &self,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Vec<Trade>, ExchangeError> {
        self.query_online_trade_history(start_ts, end_ts).await
    }

    async fn query_history_events(
        &self,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Vec<AssetMovement>, ExchangeError> {
        self.query_online_history_events(start_ts, end_ts).await
    }

    async fn query_margin_history(
        &self,
        _start_ts: Timestamp,
        _end_ts: Timestamp,
    ) -> Result<Vec<MarginPosition>, ExchangeError> {
        // poloniex has no margin history
        Ok(Vec::new())
    }
}
