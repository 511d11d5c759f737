use super::PoloniexConnector;
use crate::core::deserialize::deserialize_record;
use crate::core::errors::{DeserializationError, ExchangeError, RecordError};
use crate::core::kernel::RestClient;
use crate::core::types::{AssetMovement, HistoryEventType, Timestamp, Trade};
use crate::exchanges::poloniex::conversions::{asset_movement_from_poloniex, trade_from_poloniex};
use crate::exchanges::poloniex::rest::{EXCHANGE_NAME, WALLET_ACTIVITY_ENDPOINT};
use crate::exchanges::poloniex::types::{
    PoloniexDeposit, PoloniexMovement, PoloniexTrade, PoloniexWithdrawal,
};
use crate::utils::time::ts_ms_to_sec;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

const SPOT_ACCOUNT: &str = "SPOT";

/// Why a raw trade produced no canonical trade
enum SkippedTrade {
    OutOfRange,
    NotSpot(Option<String>),
    Failed(RecordError),
}

impl From<RecordError> for SkippedTrade {
    fn from(error: RecordError) -> Self {
        Self::Failed(error)
    }
}

impl From<DeserializationError> for SkippedTrade {
    fn from(error: DeserializationError) -> Self {
        Self::Failed(error.into())
    }
}

impl<R: RestClient> PoloniexConnector<R> {
    /// Spot trades executed within `[start_ts, end_ts]`
    ///
    /// A trade that fails to map is reported and skipped; the rest of the
    /// batch is still returned.
    pub async fn query_online_trade_history(
        &self,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let raw_data = self.rest.return_trade_history(start_ts, end_ts).await?;
        debug!(results_num = raw_data.len(), "Poloniex trade history query");

        let mut our_trades = Vec::with_capacity(raw_data.len());
        for raw_trade in &raw_data {
            match self.spot_trade_in_range(raw_trade, start_ts, end_ts) {
                Ok(trade) => our_trades.push(trade),
                Err(SkippedTrade::OutOfRange) => {}
                Err(SkippedTrade::NotSpot(account_type)) => {
                    warn!(
                        account_type = ?account_type,
                        "Error deserializing a poloniex trade. Unknown trade accountType found"
                    );
                }
                Err(SkippedTrade::Failed(e)) => self.report_trade_error(raw_trade, &e),
            }
        }

        Ok(our_trades)
    }

    fn spot_trade_in_range(
        &self,
        raw_trade: &Value,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Trade, SkippedTrade> {
        let poloniex_trade: PoloniexTrade = deserialize_record(raw_trade)?;
        if poloniex_trade.account_type.as_deref() != Some(SPOT_ACCOUNT) {
            return Err(SkippedTrade::NotSpot(poloniex_trade.account_type));
        }

        let timestamp = ts_ms_to_sec(poloniex_trade.create_time);
        if timestamp < start_ts || timestamp > end_ts {
            return Err(SkippedTrade::OutOfRange);
        }

        Ok(trade_from_poloniex(&poloniex_trade, self.assets.as_ref())?)
    }

    fn report_trade_error(&self, raw_trade: &Value, e: &RecordError) {
        match e {
            RecordError::UnsupportedAsset(identifier) => {
                self.messages.add_warning(format!(
                    "Found poloniex trade with unsupported asset {}. Ignoring it.",
                    identifier
                ));
            }
            RecordError::UnknownAsset(identifier) => {
                self.send_unknown_asset_message(identifier, "trade");
            }
            RecordError::UnprocessablePair(_) | RecordError::Deserialization(_) => {
                self.messages.add_error(
                    "Error deserializing a poloniex trade. Check the logs and open a bug report."
                        .to_string(),
                );
                error!(trade = %raw_trade, error = %e, "Error deserializing poloniex trade");
            }
        }
    }

    /// Withdrawals followed by deposits within `[start_ts, end_ts]`
    pub async fn query_online_history_events(
        &self,
        start_ts: Timestamp,
        end_ts: Timestamp,
    ) -> Result<Vec<AssetMovement>, ExchangeError> {
        let result = self.rest.return_wallet_activity(start_ts, end_ts).await?;
        let withdrawals = movement_list(&result, "withdrawals")?;
        let deposits = movement_list(&result, "deposits")?;
        debug!(
            results_num = withdrawals.len() + deposits.len(),
            "Poloniex deposits/withdrawal query"
        );

        let movements = withdrawals
            .iter()
            .map(|raw| (HistoryEventType::Withdrawal, raw))
            .chain(deposits.iter().map(|raw| (HistoryEventType::Deposit, raw)))
            .filter_map(|(event_type, raw)| self.deserialize_asset_movement(event_type, raw))
            .collect();

        Ok(movements)
    }

    /// Map one deposit or withdrawal, reporting instead of failing
    fn deserialize_asset_movement(
        &self,
        event_type: HistoryEventType,
        raw: &Value,
    ) -> Option<AssetMovement> {
        let mapped = match event_type {
            HistoryEventType::Deposit => self.map_movement::<PoloniexDeposit>(raw),
            HistoryEventType::Withdrawal => self.map_movement::<PoloniexWithdrawal>(raw),
        };

        match mapped {
            Ok(movement) => return Some(movement),
            Err(RecordError::UnsupportedAsset(identifier)) => {
                self.messages.add_warning(format!(
                    "Found {} of unsupported poloniex asset {}. Ignoring it.",
                    event_type, identifier
                ));
            }
            Err(RecordError::UnknownAsset(identifier)) => {
                self.send_unknown_asset_message(&identifier, "asset movement");
            }
            Err(e @ (RecordError::UnprocessablePair(_) | RecordError::Deserialization(_))) => {
                self.messages.add_error(
                    "Unexpected data encountered during deserialization of a poloniex \
                     asset movement. Check logs for details and open a bug report."
                        .to_string(),
                );
                error!(
                    movement = %raw,
                    error = %e,
                    "Unexpected data encountered during deserialization of poloniex {}",
                    event_type
                );
            }
        }
        None
    }

    fn map_movement<M: PoloniexMovement + DeserializeOwned>(
        &self,
        raw: &Value,
    ) -> Result<AssetMovement, RecordError> {
        let movement: M = deserialize_record(raw)?;
        asset_movement_from_poloniex(&movement, self.assets.as_ref(), &self.name)
    }
}

fn movement_list<'a>(
    result: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Result<&'a Vec<Value>, ExchangeError> {
    result
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ExchangeError::UnexpectedResponse {
            exchange: EXCHANGE_NAME.to_string(),
            command: WALLET_ACTIVITY_ENDPOINT.to_string(),
            reason: format!("missing {} list", key),
        })
}
