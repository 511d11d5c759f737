use crate::core::config::QuerySettings;
use crate::core::deserialize::{deserialize_record, json_type_name, RawRecord};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{RawResponse, RestClient, Signer};
use crate::core::traits::MessageSink;
use crate::core::types::Timestamp;
use crate::exchanges::poloniex::signer::PoloniexSigner;
use crate::exchanges::poloniex::types::PoloniexTradeKey;
use crate::utils::time::{ts_sec_to_ms, Clock};
use reqwest::Method;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const EXCHANGE_NAME: &str = "poloniex";
pub const DEFAULT_BASE_URL: &str = "https://api.poloniex.com";

/// Paths that are queried without signing
pub const PUBLIC_API_ENDPOINTS: &[&str] = &["/currencies", "/markets/price"];

pub const FEE_INFO_ENDPOINT: &str = "/feeinfo";
pub const TRADES_ENDPOINT: &str = "/trades";
pub const BALANCES_ENDPOINT: &str = "/accounts/balances";
pub const WALLET_ACTIVITY_ENDPOINT: &str = "/wallets/activity";
pub const CURRENCIES_ENDPOINT: &str = "/currencies";
pub const MARKET_PRICES_ENDPOINT: &str = "/markets/price";

const BACKOFF_BASE_SECS: f64 = 20.0;

/// Sleep before the next attempt when `tries_remaining` retries are left
///
/// Front-loaded: the first retry waits longest, later ones shrink.
pub fn backoff_for(tries_remaining: u32) -> Duration {
    Duration::from_secs_f64(BACKOFF_BASE_SECS / f64::from(tries_remaining.max(1)))
}

fn to_params(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Fail unless `result` is a JSON object
pub fn expect_object(command: &str, result: Value) -> Result<RawRecord, ExchangeError> {
    match result {
        Value::Object(map) => Ok(map),
        other => Err(ExchangeError::UnexpectedShape {
            exchange: EXCHANGE_NAME.to_string(),
            command: command.to_string(),
            expected: "dict",
            actual: json_type_name(&other),
        }),
    }
}

/// Fail unless `result` is a JSON list
pub fn expect_list(command: &str, result: Value) -> Result<Vec<Value>, ExchangeError> {
    match result {
        Value::Array(list) => Ok(list),
        other => Err(ExchangeError::UnexpectedShape {
            exchange: EXCHANGE_NAME.to_string(),
            command: command.to_string(),
            expected: "list",
            actual: json_type_name(&other),
        }),
    }
}

/// Typed Poloniex API client: signing, retries and response validation
/// on top of a raw `RestClient` transport
pub struct PoloniexRestClient<R: RestClient> {
    client: R,
    signer: Option<Arc<PoloniexSigner>>,
    clock: Arc<dyn Clock>,
    settings: QuerySettings,
    messages: Arc<dyn MessageSink>,
}

impl<R: RestClient> PoloniexRestClient<R> {
    pub fn new(
        client: R,
        signer: Option<Arc<PoloniexSigner>>,
        clock: Arc<dyn Clock>,
        settings: QuerySettings,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            client,
            signer,
            clock,
            settings,
            messages,
        }
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    /// Swap in new credentials. Returns whether anything changed.
    pub fn edit_credentials(&mut self, api_key: Option<String>, secret_key: Option<String>) -> bool {
        if api_key.is_none() && secret_key.is_none() {
            return false;
        }
        let signer = match &self.signer {
            Some(current) => current.rotated(api_key, secret_key),
            None => PoloniexSigner::new(api_key.unwrap_or_default(), secret_key.unwrap_or_default()),
        };
        self.signer = Some(Arc::new(signer));
        true
    }

    /// A single attempt
    ///
    /// Returns `Ok(None)` on a recoverable failure (gateway timeout) so the
    /// caller can back off and retry.
    pub async fn single_query(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Option<RawResponse>, ExchangeError> {
        let response = if PUBLIC_API_ENDPOINTS.contains(&path) {
            debug!("Querying poloniex for {}", path);
            self.client.get(path, params, &HashMap::new()).await?
        } else {
            let signer = self.signer.as_ref().ok_or_else(|| {
                ExchangeError::AuthError(format!(
                    "Poloniex endpoint {} requires API credentials",
                    path
                ))
            })?;
            let timestamp = self.clock.now_ms().max(0) as u64;
            let headers = signer.sign_request(&Method::GET, path, params, timestamp)?;
            self.client.get(path, params, &headers).await?
        };

        match response.status {
            504 => Ok(None),
            200 => Ok(Some(response)),
            status => Err(ExchangeError::StatusError {
                exchange: EXCHANGE_NAME.to_string(),
                status,
                body: response.body,
            }),
        }
    }

    /// Query with retries, returning the parsed JSON body
    #[instrument(skip_all, fields(exchange = EXCHANGE_NAME, command = %command))]
    pub async fn api_query(
        &self,
        command: &str,
        params: &[(String, String)],
    ) -> Result<Value, ExchangeError> {
        debug!(command = %command, params = ?params, "Poloniex API query");

        let retry_limit = self.settings.query_retry_limit;
        let mut tries = retry_limit;
        let response = loop {
            match self.single_query(command, params).await? {
                Some(response) => break response,
                None if tries >= 1 => {
                    let backoff = backoff_for(tries);
                    debug!(
                        "Got a recoverable poloniex error. Backing off for {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    tries -= 1;
                }
                None => {
                    return Err(ExchangeError::RetriesExhausted {
                        exchange: EXCHANGE_NAME.to_string(),
                        retries: retry_limit,
                    })
                }
            }
        };

        let result: Value =
            serde_json::from_str(&response.body).map_err(|_| ExchangeError::InvalidJson {
                exchange: EXCHANGE_NAME.to_string(),
                body: response.body.clone(),
            })?;

        if let Some(embedded) = result.as_object().and_then(|map| map.get("error")) {
            return Err(ExchangeError::ApiError {
                exchange: EXCHANGE_NAME.to_string(),
                command: command.to_string(),
                message: embedded
                    .as_str()
                    .map_or_else(|| embedded.to_string(), str::to_string),
            });
        }

        Ok(result)
    }

    pub async fn api_query_dict(
        &self,
        command: &str,
        params: &[(String, String)],
    ) -> Result<RawRecord, ExchangeError> {
        let result = self.api_query(command, params).await?;
        expect_object(command, result)
    }

    pub async fn api_query_list(
        &self,
        command: &str,
        params: &[(String, String)],
    ) -> Result<Vec<Value>, ExchangeError> {
        let result = self.api_query(command, params).await?;
        expect_list(command, result)
    }

    pub async fn return_fee_info(&self) -> Result<RawRecord, ExchangeError> {
        self.api_query_dict(FEE_INFO_ENDPOINT, &[]).await
    }

    /// Currency metadata. Public, never signed.
    pub async fn return_currencies(&self) -> Result<Vec<Value>, ExchangeError> {
        self.api_query_list(CURRENCIES_ENDPOINT, &[]).await
    }

    /// Latest price of every market. Public, never signed.
    pub async fn return_market_prices(&self) -> Result<Vec<Value>, ExchangeError> {
        self.api_query_list(MARKET_PRICES_ENDPOINT, &[]).await
    }

    pub async fn return_balances(&self) -> Result<Vec<Value>, ExchangeError> {
        self.api_query_list(BALANCES_ENDPOINT, &[]).await
    }

    /// Deposits and withdrawals between two second timestamps
    pub async fn return_wallet_activity(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<RawRecord, ExchangeError> {
        let params = to_params(&[("start", start.to_string()), ("end", end.to_string())]);
        self.api_query_dict(WALLET_ACTIVITY_ENDPOINT, &params).await
    }

    /// Raw trade history between two second timestamps
    ///
    /// Pages through `/trades`, moving the window start to the newest
    /// `createTime` seen, until a page comes back short. Trades already
    /// collected are skipped since consecutive windows overlap at the edge.
    pub async fn return_trade_history(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Value>, ExchangeError> {
        let limit = self.settings.trades_page_limit;
        let end_ms = ts_sec_to_ms(end);
        let mut start_ms = ts_sec_to_ms(start);
        let mut data: Vec<Value> = Vec::new();
        let mut existing_ids: HashSet<String> = HashSet::new();
        let mut pages: u32 = 0;

        loop {
            let params = to_params(&[
                ("startTime", start_ms.to_string()),
                ("endTime", end_ms.to_string()),
                ("limit", limit.to_string()),
            ]);
            let new_data = self.api_query_list(TRADES_ENDPOINT, &params).await?;
            pages += 1;
            let results_length = new_data.len();
            if pages == 1 && results_length < limit {
                return Ok(new_data);
            }

            let mut latest_ts_ms = start_ms;
            for trade in new_data {
                match deserialize_record::<PoloniexTradeKey>(&trade) {
                    Ok(key) => {
                        latest_ts_ms = latest_ts_ms.max(key.create_time);
                        if existing_ids.insert(key.id) {
                            data.push(trade);
                        }
                    }
                    Err(e) => {
                        self.messages.add_warning(
                            "Error deserializing a poloniex trade. Check the logs for details"
                                .to_string(),
                        );
                        error!(trade = %trade, error = %e, "Error deserializing poloniex trade");
                    }
                }
            }

            if results_length < limit {
                break;
            }

            if pages >= self.settings.max_pages {
                return Err(ExchangeError::PaginationLimit {
                    exchange: EXCHANGE_NAME.to_string(),
                    command: TRADES_ENDPOINT.to_string(),
                    pages,
                });
            }

            if latest_ts_ms > start_ms {
                start_ms = latest_ts_ms;
            } else {
                // a full page all stamped at the window start would be
                // returned again forever
                warn!(
                    start_ms,
                    limit,
                    "Poloniex returned a full trades page without advancing in time. \
                     Skipping ahead one millisecond"
                );
                start_ms = start_ms.saturating_add(1);
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backoff_is_front_loaded() {
        assert_eq!(backoff_for(5), Duration::from_secs(4));
        assert_eq!(backoff_for(1), Duration::from_secs(20));
        assert!(backoff_for(4) < backoff_for(2));
    }

    #[test]
    fn test_expect_object_and_list() {
        assert!(expect_object("/feeinfo", json!({"a": 1})).is_ok());
        assert!(expect_list("/trades", json!([1, 2])).is_ok());

        let error = expect_list("/trades", json!({"a": 1})).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("/trades"));
        assert!(message.contains("dict"));

        assert!(matches!(
            expect_object("/feeinfo", json!("text")),
            Err(ExchangeError::UnexpectedShape {
                expected: "dict",
                actual: "string",
                ..
            })
        ));
    }
}
