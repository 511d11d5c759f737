use crate::core::deserialize::{non_empty, non_negative_timestamp, string_or_number};
use crate::core::types::{HistoryEventType, Timestamp, TimestampMs};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// Poloniex spot trade from `/trades`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexTrade {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub symbol: String,
    pub account_type: Option<String>, // SPOT, FUTURES
    pub side: String,                 // BUY, SELL
    #[serde(deserialize_with = "non_negative_timestamp")]
    pub create_time: TimestampMs,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    pub fee_currency: Value,
    #[serde(with = "rust_decimal::serde::str")]
    pub fee_amount: Decimal,
}

/// The fields of a trade the paginator needs to move its window
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexTradeKey {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "non_negative_timestamp")]
    pub create_time: TimestampMs,
}

/// One account of a `/accounts/balances` response
///
/// Entries stay raw so a broken one is reported on its own.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexAccountBalances {
    pub account_type: Option<String>,
    pub balances: Vec<Value>,
}

/// One currency line of an account's balances
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexBalanceEntry {
    /// Left unresolved so non-string tickers can be reported
    pub currency: Value,
    #[serde(with = "rust_decimal::serde::str")]
    pub available: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub hold: Decimal,
}

impl PoloniexBalanceEntry {
    /// Available plus held amount, `None` on overflow
    pub fn total(&self) -> Option<Decimal> {
        self.available.checked_add(self.hold)
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_zero() && self.hold.is_zero()
    }
}

/// Deposit from `/wallets/activity`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexDeposit {
    #[serde(deserialize_with = "string_or_number")]
    pub deposit_number: String,
    pub currency: Value,
    pub address: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub txid: Option<String>,
    #[serde(deserialize_with = "non_negative_timestamp")]
    pub timestamp: Timestamp,
}

/// Withdrawal from `/wallets/activity`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexWithdrawal {
    #[serde(deserialize_with = "string_or_number")]
    pub withdrawal_requests_id: String,
    pub currency: Value,
    pub address: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal, // negative
    #[serde(with = "rust_decimal::serde::str")]
    pub fee: Decimal,
    #[serde(deserialize_with = "non_negative_timestamp")]
    pub timestamp: Timestamp,
    pub status: String, // e.g. "COMPLETE: <txid>"
}

/// Latest price of one market from `/markets/price`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoloniexMarketPrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// Common view over deposits and withdrawals
pub trait PoloniexMovement {
    const EVENT_TYPE: HistoryEventType;

    /// Exchange id, only unique within one event type
    fn native_id(&self) -> &str;
    fn currency(&self) -> &Value;
    fn address(&self) -> Option<String>;
    fn amount(&self) -> Decimal;
    fn fee(&self) -> Decimal;
    fn timestamp(&self) -> Timestamp;
    fn transaction_id(&self) -> Option<String>;
}

impl PoloniexMovement for PoloniexDeposit {
    const EVENT_TYPE: HistoryEventType = HistoryEventType::Deposit;

    fn native_id(&self) -> &str {
        &self.deposit_number
    }

    fn currency(&self) -> &Value {
        &self.currency
    }

    fn address(&self) -> Option<String> {
        non_empty(self.address.as_deref())
    }

    fn amount(&self) -> Decimal {
        self.amount.abs()
    }

    fn fee(&self) -> Decimal {
        Decimal::ZERO
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn transaction_id(&self) -> Option<String> {
        non_empty(self.txid.as_deref())
    }
}

impl PoloniexMovement for PoloniexWithdrawal {
    const EVENT_TYPE: HistoryEventType = HistoryEventType::Withdrawal;

    fn native_id(&self) -> &str {
        &self.withdrawal_requests_id
    }

    fn currency(&self) -> &Value {
        &self.currency
    }

    fn address(&self) -> Option<String> {
        non_empty(self.address.as_deref())
    }

    fn amount(&self) -> Decimal {
        self.amount.abs()
    }

    fn fee(&self) -> Decimal {
        self.fee
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn transaction_id(&self) -> Option<String> {
        withdrawal_transaction_id(&self.status)
    }
}

/// Transaction id carried in a withdrawal status such as `COMPLETE: 0xabc`
pub fn withdrawal_transaction_id(status: &str) -> Option<String> {
    let mut parts = status.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(txid), None) => non_empty(Some(txid.trim_start())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deserialize::deserialize_record;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_balance_entry() {
        let raw = json!({"currency": "BTC", "available": "3", "hold": "2"});
        let entry: PoloniexBalanceEntry = deserialize_record(&raw).unwrap();
        assert_eq!(entry.total(), Some(Decimal::from(5)));
        assert!(!entry.is_empty());
        assert_eq!(entry.currency, json!("BTC"));

        let raw = json!({"currency": "BTC", "available": "0.0", "hold": "0"});
        assert!(deserialize_record::<PoloniexBalanceEntry>(&raw).unwrap().is_empty());

        let raw = json!({"currency": "BTC", "available": "1"});
        let error = deserialize_record::<PoloniexBalanceEntry>(&raw).unwrap_err();
        assert!(error.to_string().contains("missing field `hold`"));
    }

    #[test]
    fn test_balance_total_overflow() {
        let raw = json!({
            "currency": "BTC",
            "available": "70000000000000000000000000000",
            "hold": "70000000000000000000000000000"
        });
        let entry: PoloniexBalanceEntry = deserialize_record(&raw).unwrap();
        assert_eq!(entry.total(), None);
    }

    #[test]
    fn test_trade_key_accepts_numeric_ids() {
        let key: PoloniexTradeKey =
            deserialize_record(&json!({"id": 42, "createTime": 1_648_635_115_535_i64})).unwrap();
        assert_eq!(key.create_time, 1_648_635_115_535);
        assert_eq!(key.id, "42");

        let key: PoloniexTradeKey =
            deserialize_record(&json!({"id": "abc", "createTime": 1})).unwrap();
        assert_eq!(key.id, "abc");

        assert!(deserialize_record::<PoloniexTradeKey>(&json!({"id": "abc"})).is_err());
        assert!(deserialize_record::<PoloniexTradeKey>(&json!([1])).is_err());
    }

    #[test]
    fn test_amounts_parse_scientific_notation() {
        let raw = json!({"symbol": "DOGE_BTC", "price": "1e-7"});
        let market: PoloniexMarketPrice = deserialize_record(&raw).unwrap();
        assert_eq!(market.price, Decimal::from_str("0.0000001").unwrap());

        let raw = json!({"symbol": "DOGE_BTC", "price": "abc"});
        assert!(deserialize_record::<PoloniexMarketPrice>(&raw).is_err());
    }

    #[test]
    fn test_withdrawal_transaction_id_tolerates_absence() {
        assert_eq!(withdrawal_transaction_id("COMPLETE"), None);
        assert_eq!(withdrawal_transaction_id("COMPLETE: "), None);
        assert_eq!(withdrawal_transaction_id("A: b: c"), None);
        assert_eq!(
            withdrawal_transaction_id("COMPLETE:0xabc").as_deref(),
            Some("0xabc")
        );
    }
}
