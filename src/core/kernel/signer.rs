use crate::core::errors::ExchangeError;
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

/// Result type for signing operations: headers to attach to the request
pub type SignatureResult = Result<HashMap<String, String>, ExchangeError>;

/// Signer trait for request authentication
///
/// Implementations are immutable signing contexts: they own the credentials
/// and produce a fresh set of headers for every call, so nothing about a
/// request leaks into shared client state.
pub trait Signer: Send + Sync {
    /// Sign a request and return the headers to include
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `endpoint` - API endpoint path
    /// * `params` - Request parameters in the order they will be sent
    /// * `timestamp` - Request timestamp in milliseconds
    fn sign_request(
        &self,
        method: &Method,
        endpoint: &str,
        params: &[(String, String)],
        timestamp: u64,
    ) -> SignatureResult;
}

/// Raw HMAC-SHA256 digest of `payload` keyed by `secret`
pub fn hmac_sha256(secret: &[u8], payload: &[u8]) -> Result<Vec<u8>, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key: {}", e)))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// HMAC-SHA256 digest encoded as standard padded base64
pub fn hmac_sha256_base64(secret: &[u8], payload: &[u8]) -> Result<String, ExchangeError> {
    hmac_sha256(secret, payload).map(|digest| general_purpose::STANDARD.encode(digest))
}
