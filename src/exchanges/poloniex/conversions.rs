use crate::core::deserialize::{get_pair_position_str, PairPosition};
use crate::core::errors::{DeserializationError, RecordError};
use crate::core::traits::AssetResolver;
use crate::core::types::{Asset, AssetMovement, Location, MovementExtraData, Trade, TradeType};
use crate::exchanges::poloniex::types::{PoloniexMovement, PoloniexTrade};
use crate::utils::address::to_checksum_address;
use crate::utils::time::{ts_ms_to_sec, ts_sec_to_ms};
use rust_decimal::Decimal;
use tracing::debug;

/// Convert a Poloniex trade into a canonical trade
pub fn trade_from_poloniex(
    poloniex_trade: &PoloniexTrade,
    assets: &dyn AssetResolver,
) -> Result<Trade, RecordError> {
    let trade_type = TradeType::deserialize_str(&poloniex_trade.side)?;
    let amount = poloniex_trade.quantity;
    let rate = poloniex_trade.price;
    let fee = poloniex_trade.fee_amount;
    let fee_currency = assets.resolve(&poloniex_trade.fee_currency)?;
    let link = poloniex_trade.id.clone();

    if amount < Decimal::ZERO {
        return Err(DeserializationError::new(format!(
            "Found negative trade amount {} in poloniex trade {}",
            amount, link
        ))
        .into());
    }
    if rate <= Decimal::ZERO {
        return Err(DeserializationError::new(format!(
            "Found non-positive trade rate {} in poloniex trade {}",
            rate, link
        ))
        .into());
    }

    let pair = poloniex_trade.symbol.as_str();
    let base_asset = assets.resolve_str(get_pair_position_str(pair, PairPosition::First)?)?;
    let quote_asset = assets.resolve_str(get_pair_position_str(pair, PairPosition::Second)?)?;

    debug!(
        pair = %pair,
        trade_type = %trade_type,
        amount = %amount,
        rate = %rate,
        fee = %fee,
        fee_currency = %fee_currency,
        "Processing poloniex trade"
    );

    Ok(Trade {
        timestamp: ts_ms_to_sec(poloniex_trade.create_time),
        location: Location::Poloniex,
        base_asset,
        quote_asset,
        trade_type,
        amount,
        rate,
        fee,
        fee_currency,
        link,
    })
}

/// Address of a movement, checksummed for ETH
///
/// ETH addresses that fail checksumming are dropped.
pub fn deserialize_asset_movement_address(
    address: Option<String>,
    asset: &Asset,
) -> Option<String> {
    let address = address?;
    if asset.identifier() == "ETH" {
        return to_checksum_address(&address);
    }
    Some(address)
}

/// Convert a Poloniex deposit or withdrawal into a canonical movement
pub fn asset_movement_from_poloniex<M: PoloniexMovement>(
    movement: &M,
    assets: &dyn AssetResolver,
    location_label: &str,
) -> Result<AssetMovement, RecordError> {
    let event_type = M::EVENT_TYPE;
    let asset = assets.resolve(movement.currency())?;
    // native ids only stay unique within one event type
    let unique_id = format!("{}_{}", event_type.serialize_str(), movement.native_id());
    let address = deserialize_asset_movement_address(movement.address(), &asset);

    Ok(AssetMovement {
        location: Location::Poloniex,
        location_label: location_label.to_string(),
        event_type,
        timestamp: ts_sec_to_ms(movement.timestamp()),
        fee_asset: asset.clone(),
        asset,
        amount: movement.amount(),
        fee: movement.fee(),
        unique_id,
        extra_data: MovementExtraData::maybe_new(address, movement.transaction_id()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deserialize::deserialize_record;
    use crate::core::types::HistoryEventType;
    use crate::exchanges::poloniex::assets::PoloniexAssetResolver;
    use crate::exchanges::poloniex::types::{PoloniexDeposit, PoloniexWithdrawal};
    use serde_json::{json, Value};
    use std::str::FromStr;

    fn raw_trade() -> Value {
        json!({
            "id": "620029441575215104",
            "symbol": "ETH_BTC",
            "accountType": "SPOT",
            "orderId": "620029441482940416",
            "side": "SELL",
            "type": "MARKET",
            "matchRole": "TAKER",
            "createTime": 1_500_758_317_000_i64,
            "price": "0.00022999",
            "quantity": "613.79427133",
            "amount": "0.14116654",
            "feeCurrency": "BTC",
            "feeAmount": "0.00000000",
            "pageId": "620029441575215104",
            "clientOrderId": ""
        })
    }

    fn with_field(key: &str, value: Value) -> PoloniexTrade {
        let mut raw = raw_trade();
        raw[key] = value;
        deserialize_record(&raw).unwrap()
    }

    #[test]
    fn test_trade_from_poloniex() {
        let resolver = PoloniexAssetResolver::new();
        let poloniex_trade: PoloniexTrade = deserialize_record(&raw_trade()).unwrap();
        let trade = trade_from_poloniex(&poloniex_trade, &resolver).unwrap();

        assert_eq!(trade.timestamp, 1_500_758_317);
        assert_eq!(trade.base_asset, Asset::new("ETH"));
        assert_eq!(trade.quote_asset, Asset::new("BTC"));
        assert_eq!(trade.trade_type, TradeType::Sell);
        assert_eq!(trade.amount, Decimal::from_str("613.79427133").unwrap());
        assert_eq!(trade.rate, Decimal::from_str("0.00022999").unwrap());
        assert_eq!(trade.fee, Decimal::ZERO);
        assert_eq!(trade.fee_currency, Asset::new("BTC"));
        assert_eq!(trade.link, "620029441575215104");
    }

    #[test]
    fn test_trade_renamed_pair_asset() {
        let resolver = PoloniexAssetResolver::new();
        let poloniex_trade = with_field("symbol", json!("STR_USDT"));
        let trade = trade_from_poloniex(&poloniex_trade, &resolver).unwrap();
        assert_eq!(trade.base_asset, Asset::new("XLM"));
        assert_eq!(trade.quote_asset, Asset::new("USDT"));
    }

    #[test]
    fn test_trade_missing_key() {
        let mut raw = raw_trade();
        raw.as_object_mut().unwrap().remove("quantity");
        let error = deserialize_record::<PoloniexTrade>(&raw).unwrap_err();
        assert!(error.to_string().contains("missing field `quantity`"));
    }

    #[test]
    fn test_trade_bad_values() {
        let resolver = PoloniexAssetResolver::new();

        assert!(matches!(
            trade_from_poloniex(&with_field("symbol", json!("ETHBTC")), &resolver),
            Err(RecordError::UnprocessablePair(_))
        ));
        assert!(matches!(
            trade_from_poloniex(&with_field("price", json!("0")), &resolver),
            Err(RecordError::Deserialization(_))
        ));
        assert!(matches!(
            trade_from_poloniex(&with_field("quantity", json!("-1")), &resolver),
            Err(RecordError::Deserialization(_))
        ));
        assert!(trade_from_poloniex(&with_field("side", json!("HOLD")), &resolver).is_err());
        assert_eq!(
            trade_from_poloniex(&with_field("symbol", json!("ETHBULL_USDT")), &resolver)
                .unwrap_err(),
            RecordError::UnsupportedAsset("ETHBULL".to_string())
        );
    }

    #[test]
    fn test_deposit_from_poloniex() {
        let resolver = PoloniexAssetResolver::new();
        let deposit: PoloniexDeposit = deserialize_record(&json!({
            "currency": "BTC",
            "address": "131rdg5Rzn6BFufnnQaHhVa5ZtRU1J2EZR",
            "amount": "0.01063000",
            "confirmations": 1,
            "txid": "3a4b9b2404f6e6fb556c3e1d46a9752f5e70a93ac1718605c992b80aacd8bd1d",
            "timestamp": 1_448_557_056,
            "status": "COMPLETE",
            "depositNumber": 42
        }))
        .unwrap();
        let movement = asset_movement_from_poloniex(&deposit, &resolver, "poloniex").unwrap();

        assert_eq!(movement.event_type, HistoryEventType::Deposit);
        assert_eq!(movement.unique_id, "deposit_42");
        assert_eq!(movement.timestamp, 1_448_557_056_000);
        assert_eq!(movement.fee, Decimal::ZERO);
        assert_eq!(movement.fee_asset, Asset::new("BTC"));
        assert_eq!(movement.location_label, "poloniex");
        assert_eq!(
            movement.transaction_id(),
            Some("3a4b9b2404f6e6fb556c3e1d46a9752f5e70a93ac1718605c992b80aacd8bd1d")
        );
        assert_eq!(movement.address(), Some("131rdg5Rzn6BFufnnQaHhVa5ZtRU1J2EZR"));
    }

    #[test]
    fn test_withdrawal_from_poloniex() {
        let resolver = PoloniexAssetResolver::new();
        let withdrawal: PoloniexWithdrawal = deserialize_record(&json!({
            "withdrawalRequestsId": 42,
            "currency": "ETH",
            "address": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "amount": "-5.00000000",
            "fee": "0.01000000",
            "timestamp": 1_468_994_442,
            "status": "COMPLETE: 0x9a2ba96a8a78b10d89b9a8c4b6d41d0a1fb2b8a44cbdfdc6d4d3fe2e10f7a3ec",
            "ipAddress": "74.125.0.1"
        }))
        .unwrap();
        let movement = asset_movement_from_poloniex(&withdrawal, &resolver, "polo").unwrap();

        assert_eq!(movement.event_type, HistoryEventType::Withdrawal);
        assert_eq!(movement.unique_id, "withdrawal_42");
        assert_eq!(movement.amount, Decimal::from(5));
        assert_eq!(movement.fee, Decimal::from_str("0.01").unwrap());
        assert_eq!(movement.fee_asset, Asset::new("ETH"));
        assert_eq!(
            movement.transaction_id(),
            Some("0x9a2ba96a8a78b10d89b9a8c4b6d41d0a1fb2b8a44cbdfdc6d4d3fe2e10f7a3ec")
        );
        assert_eq!(
            movement.address(),
            Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
        );
    }

    #[test]
    fn test_movement_missing_id() {
        let raw = json!({
            "currency": "BTC",
            "amount": "1",
            "timestamp": 1_448_557_056,
        });
        let error = deserialize_record::<PoloniexDeposit>(&raw).unwrap_err();
        assert!(error.to_string().contains("missing field `depositNumber`"));
    }

    #[test]
    fn test_bad_eth_address_is_dropped() {
        assert_eq!(
            deserialize_asset_movement_address(Some("0xnothex".to_string()), &Asset::new("ETH")),
            None
        );
        assert_eq!(
            deserialize_asset_movement_address(Some("abc".to_string()), &Asset::new("BTC"))
                .as_deref(),
            Some("abc")
        );
    }
}
