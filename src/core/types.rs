use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::errors::DeserializationError;

/// Unix timestamp in seconds
pub type Timestamp = i64;
/// Unix timestamp in milliseconds
pub type TimestampMs = i64;

/// Canonical asset identifier, independent of any exchange's ticker
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    pub fn identifier(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Poloniex,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poloniex => f.write_str("poloniex"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    /// Parse an exchange side string, case-insensitively
    pub fn deserialize_str(side: &str) -> Result<Self, DeserializationError> {
        match side.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(DeserializationError::new(format!(
                "Failed to deserialize trade type symbol. Unknown symbol {} for trade type",
                other
            ))),
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// A spot trade in base/quote form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: Timestamp,
    pub location: Location,
    pub base_asset: Asset,
    pub quote_asset: Asset,
    pub trade_type: TradeType,
    /// Amount of the base asset, never negative
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Quote units per base unit, always positive
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fee: Decimal,
    pub fee_currency: Asset,
    /// Exchange-side identifier, used as an idempotency key
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub usd_value: Decimal,
}

impl Balance {
    /// Sum of two balances of the same asset, `None` on overflow
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        Some(Self {
            amount: self.amount.checked_add(other.amount)?,
            usd_value: self.usd_value.checked_add(other.usd_value)?,
        })
    }
}

pub type BalanceMap = HashMap<Asset, Balance>;

/// Result of a balance query: balances, or `None` plus a reason
pub type ExchangeQueryBalances = (Option<BalanceMap>, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEventType {
    Deposit,
    Withdrawal,
}

impl HistoryEventType {
    pub const fn serialize_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for HistoryEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.serialize_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementExtraData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl MovementExtraData {
    /// Returns `None` when neither field carries a value
    pub fn maybe_new(address: Option<String>, transaction_id: Option<String>) -> Option<Self> {
        if address.is_none() && transaction_id.is_none() {
            return None;
        }
        Some(Self {
            address,
            transaction_id,
        })
    }
}

/// A deposit to or withdrawal from an exchange account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMovement {
    pub location: Location,
    /// Name of the exchange instance the movement was read from
    pub location_label: String,
    pub event_type: HistoryEventType,
    pub timestamp: TimestampMs,
    pub asset: Asset,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fee: Decimal,
    pub fee_asset: Asset,
    /// Unique within (event type, exchange)
    pub unique_id: String,
    pub extra_data: Option<MovementExtraData>,
}

impl AssetMovement {
    pub fn transaction_id(&self) -> Option<&str> {
        self.extra_data
            .as_ref()
            .and_then(|extra| extra.transaction_id.as_deref())
    }

    pub fn address(&self) -> Option<&str> {
        self.extra_data
            .as_ref()
            .and_then(|extra| extra.address.as_deref())
    }
}

/// Closed margin position. Exchanges without margin history return none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginPosition {
    pub location: Location,
    pub open_time: Option<Timestamp>,
    pub close_time: Timestamp,
    #[serde(with = "rust_decimal::serde::str")]
    pub profit_loss: Decimal,
    pub pl_currency: Asset,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_type_is_case_insensitive() {
        assert_eq!(TradeType::deserialize_str("BUY").unwrap(), TradeType::Buy);
        assert_eq!(TradeType::deserialize_str("sell").unwrap(), TradeType::Sell);
        assert!(TradeType::deserialize_str("short").is_err());
    }

    #[test]
    fn test_balance_checked_add() {
        let one = Balance {
            amount: Decimal::ONE,
            usd_value: Decimal::from(100),
        };
        let two = one.checked_add(&one).unwrap();
        assert_eq!(two.amount, Decimal::from(2));
        assert_eq!(two.usd_value, Decimal::from(200));

        let huge = Balance {
            amount: Decimal::ONE,
            usd_value: Decimal::MAX,
        };
        assert_eq!(huge.checked_add(&one), None);
    }

    #[test]
    fn test_extra_data_only_when_populated() {
        assert!(MovementExtraData::maybe_new(None, None).is_none());
        let extra = MovementExtraData::maybe_new(None, Some("0xabc".to_string())).unwrap();
        assert_eq!(extra.transaction_id.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_location_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Location::Poloniex).unwrap(),
            "\"poloniex\""
        );
    }
}
