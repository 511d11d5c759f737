use crate::core::errors::ExchangeError;
use crate::core::kernel::{hmac_sha256_base64, SignatureResult, Signer};
use reqwest::Method;
use secrecy::{ExposeSecret, Secret};
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::form_urlencoded;

pub const KEY_HEADER: &str = "key";
pub const SIGN_TIMESTAMP_HEADER: &str = "signTimestamp";
pub const SIGNATURE_HEADER: &str = "signature";

/// Poloniex HMAC-SHA256 signer
///
/// Immutable signing context: rotating credentials produces a new signer
/// instead of mutating this one.
#[derive(Clone)]
pub struct PoloniexSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl std::fmt::Debug for PoloniexSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoloniexSigner")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl PoloniexSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        }
    }

    /// A new signer with whichever credentials are given replaced
    pub fn rotated(&self, api_key: Option<String>, secret_key: Option<String>) -> Self {
        Self {
            api_key: api_key.map_or_else(|| self.api_key.clone(), Secret::new),
            secret_key: secret_key.map_or_else(|| self.secret_key.clone(), Secret::new),
        }
    }

    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Build the payload that goes after `METHOD\nPATH\n`
    ///
    /// GET requests sign the key-sorted, form-encoded parameters with
    /// `signTimestamp` merged in. Other methods sign the JSON body.
    pub fn signing_params(
        timestamp: u64,
        params: &[(String, String)],
        method: &Method,
    ) -> Result<String, ExchangeError> {
        if method == Method::GET {
            let timestamp = timestamp.to_string();
            let mut sorted: Vec<(&str, &str)> = params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .chain(std::iter::once((SIGN_TIMESTAMP_HEADER, timestamp.as_str())))
                .collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));

            Ok(form_urlencoded::Serializer::new(String::new())
                .extend_pairs(sorted)
                .finish())
        } else {
            let body: Map<String, Value> = params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let request_body = serde_json::to_string(&body)?;
            Ok(format!(
                "requestBody={}&signTimestamp={}",
                request_body, timestamp
            ))
        }
    }

    /// Signature for a request, base64 encoded
    pub fn create_sign(
        &self,
        timestamp: u64,
        params: &[(String, String)],
        method: &Method,
        path: &str,
    ) -> Result<String, ExchangeError> {
        let encoded = Self::signing_params(timestamp, params, method)?;
        let payload = [method.as_str(), path, encoded.as_str()].join("\n");
        hmac_sha256_base64(self.secret_key.expose_secret().as_bytes(), payload.as_bytes())
    }
}

impl Signer for PoloniexSigner {
    fn sign_request(
        &self,
        method: &Method,
        endpoint: &str,
        params: &[(String, String)],
        timestamp: u64,
    ) -> SignatureResult {
        let signature = self.create_sign(timestamp, params, method, endpoint)?;

        let mut headers = HashMap::new();
        headers.insert(KEY_HEADER.to_string(), self.api_key().to_string());
        headers.insert(SIGN_TIMESTAMP_HEADER.to_string(), timestamp.to_string());
        headers.insert(SIGNATURE_HEADER.to_string(), signature);

        Ok(headers)
    }
}
