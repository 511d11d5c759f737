use super::{CachedBalances, PoloniexConnector};
use crate::core::deserialize::deserialize_record;
use crate::core::errors::{AssetError, ExchangeError};
use crate::core::kernel::RestClient;
use crate::core::types::{Balance, BalanceMap, ExchangeQueryBalances};
use crate::exchanges::poloniex::assets::DELISTED_LEND;
use crate::exchanges::poloniex::types::{PoloniexAccountBalances, PoloniexBalanceEntry};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error};

const INVALID_API_KEY: &str = "Invalid API key";

impl<R: RestClient> PoloniexConnector<R> {
    /// Check the credentials with an authenticated `/feeinfo` call
    pub async fn check_api_key(&self) -> Result<(bool, String), ExchangeError> {
        match self.rest.return_fee_info().await {
            Ok(_) => Ok((true, String::new())),
            Err(e) if e.to_string().contains(INVALID_API_KEY) => {
                Ok((false, "Provided API Key or secret is invalid".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Balances, served from cache while younger than the configured TTL
    ///
    /// The lock is held across the remote query so concurrent callers wait
    /// for one fetch instead of racing their own.
    pub async fn cached_balances(&self) -> ExchangeQueryBalances {
        let ttl = Duration::from_secs(self.rest.settings().balance_cache_secs);
        let mut cache = self.balances.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < ttl {
                debug!("Returning cached poloniex balances");
                return (Some(cached.balances.clone()), String::new());
            }
        }

        let (balances, message) = self.query_online_balances().await;
        if let Some(balances) = &balances {
            *cache = Some(CachedBalances {
                fetched_at: Instant::now(),
                balances: balances.clone(),
            });
        }
        (balances, message)
    }

    /// Uncached balance query
    ///
    /// Remote failures degrade to `(None, message)`. Entries for the same
    /// asset in several accounts are summed.
    pub async fn query_online_balances(&self) -> ExchangeQueryBalances {
        let accounts = match self.rest.return_balances().await {
            Ok(accounts) => accounts,
            Err(e) => {
                let msg = format!(
                    "Poloniex API request failed. Could not reach poloniex due to {}",
                    e
                );
                error!("{}", msg);
                return (None, msg);
            }
        };

        let mut assets_balance = BalanceMap::new();
        for account_info in &accounts {
            let Ok(account) = deserialize_record::<PoloniexAccountBalances>(account_info) else {
                self.messages.add_error(
                    "Could not find balances key in the balances response".to_string(),
                );
                continue;
            };

            for entry in &account.balances {
                self.process_balance_entry(entry, &mut assets_balance).await;
            }
        }

        (Some(assets_balance), String::new())
    }

    async fn process_balance_entry(&self, entry: &Value, assets_balance: &mut BalanceMap) {
        let balance_entry = match deserialize_record::<PoloniexBalanceEntry>(entry) {
            Ok(balance_entry) => balance_entry,
            Err(e) => {
                self.messages.add_error(format!(
                    "Could not deserialize amount from poloniex due to {}. \
                     Ignoring its balance query.",
                    e
                ));
                return;
            }
        };

        if balance_entry.is_empty() {
            return;
        }

        let asset = match self.assets.resolve(&balance_entry.currency) {
            Ok(asset) => asset,
            Err(AssetError::Unsupported { identifier }) => {
                self.messages.add_warning(format!(
                    "Found unsupported poloniex asset {}. Ignoring its balance query.",
                    identifier
                ));
                return;
            }
            Err(AssetError::Unknown { identifier }) => {
                self.send_unknown_asset_message(&identifier, "balance query");
                return;
            }
            Err(AssetError::Deserialization(e)) => {
                error!(
                    currency = %balance_entry.currency,
                    error = %e,
                    "Unexpected poloniex asset type. Expected string"
                );
                self.messages.add_error(
                    "Found poloniex asset entry with non-string type. \
                     Ignoring its balance query."
                        .to_string(),
                );
                return;
            }
        };

        // poloniex keeps reporting balances of the delisted LEND token
        if asset.identifier() == DELISTED_LEND {
            return;
        }

        let usd_price = match self.prices.find_usd_price(&asset).await {
            Ok(price) => price,
            Err(e) => {
                self.messages.add_error(format!(
                    "Error processing poloniex balance entry due to inability to \
                     query USD price: {}. Skipping balance entry",
                    e
                ));
                return;
            }
        };

        let balance = balance_entry.total().and_then(|amount| {
            Some(Balance {
                amount,
                usd_value: amount.checked_mul(usd_price)?,
            })
        });
        let Some(balance) = balance else {
            self.messages.add_error(format!(
                "Poloniex balance of {} overflows the decimal range. Skipping balance entry",
                asset
            ));
            return;
        };
        debug!(
            currency = %asset,
            amount = %balance.amount,
            usd_value = %balance.usd_value,
            "Poloniex balance query"
        );

        let merged = match assets_balance.get(&asset) {
            Some(existing) => existing.checked_add(&balance),
            None => Some(balance),
        };
        match merged {
            Some(merged) => {
                assets_balance.insert(asset, merged);
            }
            None => self.messages.add_error(format!(
                "Summing poloniex balances of {} across accounts overflows the decimal \
                 range. Skipping balance entry",
                asset
            )),
        }
    }
}
