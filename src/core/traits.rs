use crate::core::{
    errors::{AssetError, ExchangeError},
    types::{Asset, AssetMovement, ExchangeQueryBalances, MarginPosition, Timestamp, Trade},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

/// History and balance queries every exchange integration offers
#[async_trait]
pub trait ExchangeInterface: Send + Sync {
    /// Instance name, used as the movement location label
    fn name(&self) -> &str;

    /// Check the configured credentials against the exchange
    async fn validate_api_key(&self) -> Result<(bool, String), ExchangeError>;

    /// Current balances. Remote failures degrade to `(None, message)`.
    async fn query_balances(&self) -> ExchangeQueryBalances;

    /// Trades executed within `[start_ts, end_ts]`
    async fn query_trades(
        &self,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Vec<Trade>, ExchangeError>;

    /// Deposits and withdrawals within `[start_ts, end_ts]`
    async fn query_history_events(
        &self,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Vec<AssetMovement>, ExchangeError>;

    async fn query_margin_history(
        &self,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Vec<MarginPosition>, ExchangeError>;
}

/// Maps an exchange's ticker to a canonical asset
pub trait AssetResolver: Send + Sync {
    /// `symbol` is the raw JSON value so that non-string tickers can be reported
    fn resolve(&self, symbol: &Value) -> Result<Asset, AssetError>;

    fn resolve_str(&self, symbol: &str) -> Result<Asset, AssetError> {
        self.resolve(&Value::String(symbol.to_string()))
    }
}

/// USD price source used to value balances
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn find_usd_price(&self, asset: &Asset) -> Result<Decimal, ExchangeError>;
}

/// Fire-and-forget user-facing notifications
pub trait MessageSink: Send + Sync {
    fn add_warning(&self, message: String);
    fn add_error(&self, message: String);
}
