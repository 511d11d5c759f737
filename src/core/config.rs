use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_QUERY_RETRY_LIMIT: u32 = 5;
pub const DEFAULT_BALANCE_CACHE_SECS: u64 = 600;
pub const DEFAULT_TRADES_PAGE_LIMIT: usize = 100;
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub base_url: Option<String>,
    pub settings: QuerySettings,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 4)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("settings", &self.settings)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            base_url: Option<String>,
            #[serde(default)]
            settings: QuerySettings,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            base_url: helper.base_url,
            settings: helper.settings,
        })
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials and default settings
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url: None,
            settings: QuerySettings::default(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (e.g., `POLONIEX_API_KEY`)
    /// - `{EXCHANGE}_SECRET_KEY` (e.g., `POLONIEX_SECRET_KEY`)
    /// - `{EXCHANGE}_BASE_URL` (optional)
    /// - `{EXCHANGE}_QUERY_RETRY_LIMIT`, `{EXCHANGE}_CONNECT_TIMEOUT`,
    ///   `{EXCHANGE}_READ_TIMEOUT` (optional)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);
        let base_url_var = format!("{}_BASE_URL", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let base_url = env::var(&base_url_var).ok();

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            base_url,
            settings: QuerySettings::from_env(&prefix)?,
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // no .env file, fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange_prefix)
    }

    /// Check if this configuration has credentials for authenticated endpoints
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Set custom base URL
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

/// Query tuning shared by every call a connector makes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Number of backoff retries after a recoverable failure
    pub query_retry_limit: u32,
    pub balance_cache_secs: u64,
    pub trades_page_limit: usize,
    /// Hard cap on pages fetched by a single paginated query
    pub max_pages: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            query_retry_limit: DEFAULT_QUERY_RETRY_LIMIT,
            balance_cache_secs: DEFAULT_BALANCE_CACHE_SECS,
            trades_page_limit: DEFAULT_TRADES_PAGE_LIMIT,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl QuerySettings {
    /// Read optional overrides from `{PREFIX}_QUERY_RETRY_LIMIT`,
    /// `{PREFIX}_CONNECT_TIMEOUT` and `{PREFIX}_READ_TIMEOUT`
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        if let Some(limit) = parse_env_var::<u32>(&format!("{}_QUERY_RETRY_LIMIT", prefix))? {
            settings.query_retry_limit = limit;
        }
        if let Some(secs) = parse_env_var::<u64>(&format!("{}_CONNECT_TIMEOUT", prefix))? {
            settings.connect_timeout_secs = secs;
        }
        if let Some(secs) = parse_env_var::<u64>(&format!("{}_READ_TIMEOUT", prefix))? {
            settings.read_timeout_secs = secs;
        }
        Ok(settings)
    }

    #[must_use]
    pub const fn with_retry_limit(mut self, query_retry_limit: u32) -> Self {
        self.query_retry_limit = query_retry_limit;
        self
    }

    #[must_use]
    pub const fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        self
    }

    #[must_use]
    pub const fn with_trades_page_limit(mut self, limit: usize) -> Self {
        self.trades_page_limit = limit;
        self
    }

    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    #[must_use]
    pub const fn with_balance_cache_secs(mut self, secs: u64) -> Self {
        self.balance_cache_secs = secs;
        self
    }

    /// (connect, read) timeout pair applied to every HTTP call
    pub const fn timeout_tuple(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.read_timeout_secs),
        )
    }
}

fn parse_env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::InvalidConfiguration(format!("{} has an invalid value: {}", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_redacts_credentials() {
        let config = ExchangeConfig::new("my_key".to_string(), "my_secret".to_string());
        let serialized = serde_json::to_string(&config).unwrap();
        assert!(!serialized.contains("my_key"));
        assert!(!serialized.contains("my_secret"));
        assert!(serialized.contains("[REDACTED]"));
    }

    #[test]
    fn test_deserialize_uses_default_settings() {
        let config: ExchangeConfig =
            serde_json::from_str(r#"{"api_key": "k", "secret_key": "s", "base_url": null}"#)
                .unwrap();
        assert_eq!(config.api_key(), "k");
        assert_eq!(config.settings, QuerySettings::default());
        assert!(config.has_credentials());
    }

    #[test]
    fn test_from_env_reads_overrides() {
        env::set_var("LEDGERX_CFGTEST_API_KEY", "key");
        env::set_var("LEDGERX_CFGTEST_SECRET_KEY", "secret");
        env::set_var("LEDGERX_CFGTEST_QUERY_RETRY_LIMIT", "2");
        let config = ExchangeConfig::from_env("ledgerx_cfgtest").unwrap();
        assert_eq!(config.settings.query_retry_limit, 2);
        assert_eq!(config.settings.read_timeout_secs, DEFAULT_READ_TIMEOUT_SECS);

        env::set_var("LEDGERX_CFGTEST_QUERY_RETRY_LIMIT", "many");
        assert!(matches!(
            ExchangeConfig::from_env("ledgerx_cfgtest"),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let result = ExchangeConfig::from_env("LEDGERX_DOES_NOT_EXIST");
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvironmentVariable(_))
        ));
    }
}
