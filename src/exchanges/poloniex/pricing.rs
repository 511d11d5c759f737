use crate::core::deserialize::deserialize_record;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::PriceOracle;
use crate::core::types::Asset;
use crate::exchanges::poloniex::rest::{PoloniexRestClient, EXCHANGE_NAME, MARKET_PRICES_ENDPOINT};
use crate::exchanges::poloniex::types::PoloniexMarketPrice;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Assets valued at exactly one dollar
const USD_STABLECOINS: &[&str] = &["USD", "USDT", "USDC", "DAI", "TUSD"];

const BTC: &str = "BTC";

struct PriceSnapshot {
    fetched_at: Instant,
    prices: HashMap<String, Decimal>,
}

/// USD price of `asset` from a map of `BASE_QUOTE -> last price`
///
/// Dollar stablecoins are treated as USD. Assets only quoted in BTC are
/// routed through `BTC_USDT`.
pub fn usd_price_from_markets(prices: &HashMap<String, Decimal>, asset: &str) -> Option<Decimal> {
    if USD_STABLECOINS.contains(&asset) {
        return Some(Decimal::ONE);
    }

    let quoted = |quote: &str| prices.get(&format!("{}_{}", asset, quote)).copied();
    quoted("USDT").or_else(|| quoted("USDC")).or_else(|| {
        let in_btc = quoted(BTC)?;
        let btc_usd = usd_price_from_markets(prices, BTC)?;
        in_btc.checked_mul(btc_usd)
    })
}

/// Price oracle backed by the public `/markets/price` endpoint
///
/// One snapshot of all markets is fetched and reused for `ttl`.
pub struct PoloniexPriceOracle<R: RestClient> {
    rest: PoloniexRestClient<R>,
    ttl: Duration,
    snapshot: Mutex<Option<PriceSnapshot>>,
}

impl<R: RestClient> PoloniexPriceOracle<R> {
    pub fn new(rest: PoloniexRestClient<R>, ttl: Duration) -> Self {
        Self {
            rest,
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    async fn fetch_prices(&self) -> Result<HashMap<String, Decimal>, ExchangeError> {
        let markets = self.rest.return_market_prices().await?;
        let mut prices = HashMap::with_capacity(markets.len());
        for market in &markets {
            match deserialize_record::<PoloniexMarketPrice>(market) {
                Ok(entry) => {
                    prices.insert(entry.symbol, entry.price);
                }
                Err(e) => debug!(entry = %market, error = %e, "Skipping poloniex market price"),
            }
        }
        Ok(prices)
    }
}

#[async_trait]
impl<R: RestClient> PriceOracle for PoloniexPriceOracle<R> {
    async fn find_usd_price(&self, asset: &Asset) -> Result<Decimal, ExchangeError> {
        if USD_STABLECOINS.contains(&asset.identifier()) {
            return Ok(Decimal::ONE);
        }

        let mut snapshot = self.snapshot.lock().await;
        let stale = snapshot
            .as_ref()
            .map_or(true, |s| s.fetched_at.elapsed() >= self.ttl);
        if stale {
            let prices = self.fetch_prices().await?;
            *snapshot = Some(PriceSnapshot {
                fetched_at: Instant::now(),
                prices,
            });
        }

        snapshot
            .as_ref()
            .and_then(|s| usd_price_from_markets(&s.prices, asset.identifier()))
            .ok_or_else(|| ExchangeError::UnexpectedResponse {
                exchange: EXCHANGE_NAME.to_string(),
                command: MARKET_PRICES_ENDPOINT.to_string(),
                reason: format!("no market to derive a USD price for {}", asset),
            })
    }
}
