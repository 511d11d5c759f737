use crate::core::config::QuerySettings;
use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{instrument, trace};

/// Status code and body of an HTTP response, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// REST transport trait
///
/// The transport only moves bytes: it neither signs, retries nor inspects
/// status codes. Exchange clients layer those policies on top, which also
/// lets tests substitute a scripted transport.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Issue a request
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters, URL-encoded in the given order
    /// * `headers` - Per-request headers
    ///
    /// # Returns
    /// The raw response, or an error if the server could not be reached
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, ExchangeError>;

    /// Make a GET request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, ExchangeError> {
        self.request(Method::GET, endpoint, query_params, headers)
            .await
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        let (connect_timeout, read_timeout) = QuerySettings::default().timeout_tuple();
        Self {
            base_url,
            exchange_name,
            connect_timeout,
            read_timeout,
            user_agent: "LedgerX/0.1".to_string(),
        }
    }

    /// Set the (connect, read) timeout pair
    pub fn with_timeouts(mut self, (connect, read): (Duration, Duration)) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self { config }
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        // reqwest 0.11 has no separate read timeout, so the total budget
        // covers connecting plus reading
        let client = Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.connect_timeout + self.config.read_timeout)
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| ExchangeError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ReqwestRest {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone, Debug)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
}

impl ReqwestRest {
    pub fn new(base_url: String, exchange_name: String) -> Result<Self, ExchangeError> {
        RestClientBuilder::new(RestClientConfig::new(base_url, exchange_name)).build()
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params, headers), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, ExchangeError> {
        let mut request = self.client.request(method, self.build_url(endpoint));

        if !query_params.is_empty() {
            request = request.query(query_params);
        }

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(status, "Response body: {}", body);

        Ok(RawResponse { status, body })
    }
}
