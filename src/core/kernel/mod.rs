//! Exchange-agnostic transport layer
//!
//! The kernel holds only transport and authentication primitives:
//!
//! - `RestClient`: unified HTTP interface returning raw status + body
//! - `ReqwestRest`: the reqwest-backed implementation
//! - `Signer`: pluggable per-request authentication
//!
//! Retry policy, response validation and record mapping live with each
//! exchange, on top of these traits.
//!
//! ```rust,no_run
//! use ledgerx::core::kernel::*;
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RestClientConfig::new("https://api.poloniex.com".to_string(), "poloniex".to_string());
//! let rest = RestClientBuilder::new(config).build()?;
//! let response = rest.get("/currencies", &[], &HashMap::new()).await?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```
pub mod rest;
pub mod signer;

pub use rest::{RawResponse, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{hmac_sha256, hmac_sha256_base64, SignatureResult, Signer};
