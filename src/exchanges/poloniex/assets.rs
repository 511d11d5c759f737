use crate::core::errors::{AssetError, DeserializationError};
use crate::core::traits::AssetResolver;
use crate::core::types::Asset;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Poloniex keeps returning balances for this delisted token
pub const DELISTED_LEND: &str = "LEND";

/// Poloniex tickers that differ from the canonical identifier
const POLONIEX_TO_WORLD: &[(&str, &str)] = &[
    ("AIR", "AIR-2"),
    ("APH", "APH-2"),
    ("BCC", "BTCtalkcoin"),
    ("BCHABC", "BCH"),
    ("BCHSV", "BSV"),
    ("BITS", "BITS-2"),
    ("BTM", "BTM-2"),
    ("CON", "CON-2"),
    ("SOC", "SOCC"),
    ("STR", "XLM"),
    ("TAC", "TAC-2"),
    ("XAP", "XAP-2"),
];

/// Tickers with no canonical counterpart (leveraged tokens, delisted forks)
const UNSUPPORTED_POLONIEX_ASSETS: &[&str] = &[
    "AEON", "BALLS", "BCHBEAR", "BCHBULL", "BEAR", "BSVBEAR", "BSVBULL", "BULL", "BVOL",
    "ETHBEAR", "ETHBULL", "EOSBEAR", "EOSBULL", "IBVOL", "LINKBEAR", "LINKBULL", "TRXBEAR",
    "TRXBULL", "USDTBEAR", "USDTBULL", "XRPBEAR", "XRPBULL",
];

/// Resolves Poloniex tickers to canonical assets
///
/// With a registry of known identifiers, anything outside it is reported as
/// unknown. Without one every supported ticker resolves.
#[derive(Debug, Clone)]
pub struct PoloniexAssetResolver {
    renames: HashMap<&'static str, &'static str>,
    unsupported: HashSet<&'static str>,
    known_assets: Option<HashSet<String>>,
}

impl Default for PoloniexAssetResolver {
    fn default() -> Self {
        Self {
            renames: POLONIEX_TO_WORLD.iter().copied().collect(),
            unsupported: UNSUPPORTED_POLONIEX_ASSETS.iter().copied().collect(),
            known_assets: None,
        }
    }
}

impl PoloniexAssetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict resolution to the given canonical identifiers
    pub fn with_known_assets<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_assets = Some(identifiers.into_iter().map(Into::into).collect());
        self
    }
}

impl AssetResolver for PoloniexAssetResolver {
    fn resolve(&self, symbol: &Value) -> Result<Asset, AssetError> {
        let Some(symbol) = symbol.as_str() else {
            return Err(DeserializationError::new(format!(
                "Tried to initialize a poloniex asset out of a non-string identifier {}",
                symbol
            ))
            .into());
        };

        if self.unsupported.contains(symbol) {
            return Err(AssetError::Unsupported {
                identifier: symbol.to_string(),
            });
        }

        let identifier = self.renames.get(symbol).copied().unwrap_or(symbol);
        if let Some(known) = &self.known_assets {
            if !known.contains(identifier) {
                return Err(AssetError::Unknown {
                    identifier: symbol.to_string(),
                });
            }
        }

        Ok(Asset::new(identifier))
    }
}
