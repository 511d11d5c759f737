use crate::core::config::{ExchangeConfig, QuerySettings};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
use crate::core::messages::MessagesAggregator;
use crate::core::traits::{AssetResolver, MessageSink, PriceOracle};
use crate::exchanges::poloniex::assets::PoloniexAssetResolver;
use crate::exchanges::poloniex::connector::PoloniexConnector;
use crate::exchanges::poloniex::pricing::PoloniexPriceOracle;
use crate::exchanges::poloniex::rest::{PoloniexRestClient, DEFAULT_BASE_URL, EXCHANGE_NAME};
use crate::exchanges::poloniex::signer::PoloniexSigner;
use crate::utils::time::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating Poloniex connectors
///
/// Collaborators that are not set fall back to the Poloniex asset table,
/// a `/markets/price` backed oracle, an in-memory message sink and the
/// system clock.
pub struct PoloniexBuilder {
    config: ExchangeConfig,
    name: String,
    assets: Option<Arc<dyn AssetResolver>>,
    prices: Option<Arc<dyn PriceOracle>>,
    messages: Option<Arc<dyn MessageSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for PoloniexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PoloniexBuilder {
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig::new(String::new(), String::new()),
            name: EXCHANGE_NAME.to_string(),
            assets: None,
            prices: None,
            messages: None,
            clock: None,
        }
    }

    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_credentials(mut self, api_key: String, secret_key: String) -> Self {
        let settings = self.config.settings.clone();
        let base_url = self.config.base_url.take();
        self.config = ExchangeConfig::new(api_key, secret_key).with_settings(settings);
        self.config.base_url = base_url;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.config.base_url = Some(base_url);
        self
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Instance name, reported as the location label of movements
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_asset_resolver(mut self, assets: Arc<dyn AssetResolver>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn with_price_oracle(mut self, prices: Arc<dyn PriceOracle>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_messages(mut self, messages: Arc<dyn MessageSink>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build a connector over reqwest
    pub fn build(self) -> Result<PoloniexConnector<ReqwestRest>, ExchangeError> {
        let base_url = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let rest_config = RestClientConfig::new(base_url, EXCHANGE_NAME.to_string())
            .with_timeouts(self.config.settings.timeout_tuple());
        let rest = RestClientBuilder::new(rest_config).build()?;

        self.build_with_rest(rest)
    }

    /// Build a connector over any transport
    pub fn build_with_rest<R>(self, rest: R) -> Result<PoloniexConnector<R>, ExchangeError>
    where
        R: RestClient + Clone + 'static,
    {
        let settings = self.config.settings.clone();
        let messages: Arc<dyn MessageSink> = self
            .messages
            .unwrap_or_else(|| Arc::new(MessagesAggregator::new()));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let assets: Arc<dyn AssetResolver> = self
            .assets
            .unwrap_or_else(|| Arc::new(PoloniexAssetResolver::new()));

        let prices: Arc<dyn PriceOracle> = match self.prices {
            Some(prices) => prices,
            None => {
                let public_rest = PoloniexRestClient::new(
                    rest.clone(),
                    None,
                    clock.clone(),
                    settings.clone(),
                    messages.clone(),
                );
                Arc::new(PoloniexPriceOracle::new(
                    public_rest,
                    Duration::from_secs(settings.balance_cache_secs),
                ))
            }
        };

        let signer = self.config.has_credentials().then(|| {
            Arc::new(PoloniexSigner::new(
                self.config.api_key().to_string(),
                self.config.secret_key().to_string(),
            ))
        });

        let client = PoloniexRestClient::new(rest, signer, clock, settings, messages.clone());
        Ok(PoloniexConnector::new(
            self.name, client, assets, prices, messages,
        ))
    }
}

/// Create a Poloniex connector from configuration with default collaborators
pub fn build_connector(
    config: ExchangeConfig,
) -> Result<PoloniexConnector<ReqwestRest>, ExchangeError> {
    PoloniexBuilder::new().with_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::ExchangeInterface;

    #[test]
    fn test_build_without_credentials_cannot_sign() {
        let connector = PoloniexBuilder::new().build().unwrap();
        assert!(!connector.rest().can_sign());
        assert_eq!(connector.name(), "poloniex");
    }

    #[test]
    fn test_build_with_credentials_and_settings() {
        let connector = PoloniexBuilder::new()
            .with_settings(QuerySettings::default().with_retry_limit(2))
            .with_credentials("key".to_string(), "secret".to_string())
            .with_name("polo main")
            .build()
            .unwrap();
        assert!(connector.rest().can_sign());
        assert_eq!(connector.rest().settings().query_retry_limit, 2);
        assert_eq!(connector.name(), "polo main");
    }

    #[test]
    fn test_edit_credentials_enables_signing() {
        let mut connector = build_connector(ExchangeConfig::new(String::new(), String::new()))
            .unwrap();
        assert!(!connector.edit_credentials(None, None));
        assert!(connector.edit_credentials(Some("key".to_string()), Some("secret".to_string())));
        assert!(connector.rest().can_sign());
    }
}
