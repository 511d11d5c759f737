//! Helpers for turning loosely typed exchange JSON into canonical values.
//!
//! Records are decoded one at a time into typed structs so a single broken
//! entry never fails the whole response.

use crate::core::errors::{DeserializationError, RecordError};
use crate::core::types::Timestamp;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Untyped exchange record
pub type RawRecord = Map<String, Value>;

/// Name of the JSON type, for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Decode one raw record into its typed form
pub fn deserialize_record<'a, T: Deserialize<'a>>(
    raw: &'a Value,
) -> Result<T, DeserializationError> {
    T::deserialize(raw).map_err(DeserializationError::from)
}

/// Identifier sent either as a JSON string or a JSON number
pub fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "Expected a string or number identifier but got {}",
            json_type_name(&other)
        ))),
    }
}

/// Non-negative integer timestamp, as a number or numeric string
pub fn non_negative_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Timestamp, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(timestamp) if timestamp >= 0 => Ok(timestamp),
        _ => Err(D::Error::custom(format!(
            "Failed to deserialize a timestamp from {}",
            value
        ))),
    }
}

/// Empty strings mean absent
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPosition {
    First,
    Second,
}

/// Pick one side of an underscore-delimited pair such as `BTC_USDT`
pub fn get_pair_position_str(pair: &str, position: PairPosition) -> Result<&str, RecordError> {
    let mut parts = pair.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), None) if !first.is_empty() && !second.is_empty() => {
            Ok(match position {
                PairPosition::First => first,
                PairPosition::Second => second,
            })
        }
        _ => Err(RecordError::UnprocessablePair(pair.to_string())),
    }
}
