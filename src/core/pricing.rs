use crate::core::errors::ExchangeError;
use crate::core::traits::PriceOracle;
use crate::core::types::Asset;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Fixed USD prices, for offline use and tests
///
/// Assets without a configured price fail the lookup like an unreachable
/// remote oracle would.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceOracle {
    prices: HashMap<Asset, Decimal>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, asset: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(Asset::new(asset), price);
        self
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn find_usd_price(&self, asset: &Asset) -> Result<Decimal, ExchangeError> {
        self.prices
            .get(asset)
            .copied()
            .ok_or_else(|| ExchangeError::NetworkError(format!("No USD price known for {}", asset)))
    }
}
