#![allow(dead_code)]

use async_trait::async_trait;
use ledgerx::core::config::QuerySettings;
use ledgerx::core::errors::ExchangeError;
use ledgerx::core::kernel::{RawResponse, RestClient};
use ledgerx::core::messages::MessagesAggregator;
use ledgerx::core::pricing::StaticPriceOracle;
use ledgerx::exchanges::poloniex::{
    PoloniexAssetResolver, PoloniexBuilder, PoloniexConnector, PoloniexRestClient, PoloniexSigner,
};
use ledgerx::utils::time::FixedClock;
use reqwest::Method;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test_api_key";
pub const SECRET_KEY: &str = "test_secret_key";
pub const NOW_MS: i64 = 1_700_000_000_000;

/// A request as the transport saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Script {
    responses: HashMap<String, VecDeque<RawResponse>>,
    requests: Vec<RecordedRequest>,
}

/// In-memory transport replaying queued responses per endpoint
#[derive(Clone, Default)]
pub struct ScriptedRest {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, endpoint: &str, status: u16, body: impl Into<String>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .responses
            .entry(endpoint.to_string())
            .or_default()
            .push_back(RawResponse::new(status, body));
        self
    }

    pub fn respond_json(&self, endpoint: &str, body: &Value) -> &Self {
        self.respond(endpoint, 200, body.to_string())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.endpoint == endpoint)
            .collect()
    }
}

#[async_trait]
impl RestClient for ScriptedRest {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, ExchangeError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(RecordedRequest {
            method,
            endpoint: endpoint.to_string(),
            query: query_params.to_vec(),
            headers: headers.clone(),
        });
        script
            .responses
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                ExchangeError::NetworkError(format!("no scripted response for {}", endpoint))
            })
    }
}

pub fn signed_client(
    rest: &ScriptedRest,
    settings: QuerySettings,
    messages: Arc<MessagesAggregator>,
) -> PoloniexRestClient<ScriptedRest> {
    PoloniexRestClient::new(
        rest.clone(),
        Some(Arc::new(PoloniexSigner::new(
            API_KEY.to_string(),
            SECRET_KEY.to_string(),
        ))),
        Arc::new(FixedClock::new(NOW_MS)),
        settings,
        messages,
    )
}

pub fn unsigned_client(
    rest: &ScriptedRest,
    messages: Arc<MessagesAggregator>,
) -> PoloniexRestClient<ScriptedRest> {
    PoloniexRestClient::new(
        rest.clone(),
        None,
        Arc::new(FixedClock::new(NOW_MS)),
        QuerySettings::default(),
        messages,
    )
}

pub fn test_prices() -> StaticPriceOracle {
    StaticPriceOracle::new()
        .with_price("BTC", 100.into())
        .with_price("ETH", 10.into())
        .with_price("USDT", 1.into())
}

pub fn connector(
    rest: &ScriptedRest,
    settings: QuerySettings,
    messages: Arc<MessagesAggregator>,
) -> PoloniexConnector<ScriptedRest> {
    PoloniexBuilder::new()
        .with_credentials(API_KEY.to_string(), SECRET_KEY.to_string())
        .with_settings(settings)
        .with_name("poloniex_main")
        .with_price_oracle(Arc::new(test_prices()))
        .with_messages(messages)
        .with_clock(Arc::new(FixedClock::new(NOW_MS)))
        .build_with_rest(rest.clone())
        .unwrap()
}

/// Connector whose resolver only knows BTC, ETH and USDT
pub fn registry_connector(
    rest: &ScriptedRest,
    messages: Arc<MessagesAggregator>,
) -> PoloniexConnector<ScriptedRest> {
    PoloniexBuilder::new()
        .with_credentials(API_KEY.to_string(), SECRET_KEY.to_string())
        .with_asset_resolver(Arc::new(
            PoloniexAssetResolver::new().with_known_assets(["BTC", "ETH", "USDT"]),
        ))
        .with_price_oracle(Arc::new(test_prices()))
        .with_messages(messages)
        .with_clock(Arc::new(FixedClock::new(NOW_MS)))
        .build_with_rest(rest.clone())
        .unwrap()
}

/// A raw `/trades` entry
pub fn raw_trade(id: u64, create_time_ms: i64) -> Value {
    serde_json::json!({
        "id": id.to_string(),
        "symbol": "ETH_BTC",
        "accountType": "SPOT",
        "orderId": format!("9{}", id),
        "side": "BUY",
        "type": "LIMIT",
        "matchRole": "MAKER",
        "createTime": create_time_ms,
        "price": "0.05",
        "quantity": "2",
        "amount": "0.1",
        "feeCurrency": "ETH",
        "feeAmount": "0.002",
        "pageId": id.to_string(),
        "clientOrderId": ""
    })
}
