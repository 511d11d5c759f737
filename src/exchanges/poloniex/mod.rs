pub mod assets;
pub mod conversions;
pub mod signer;
pub mod types;

pub mod builder;
pub mod connector;
pub mod pricing;
pub mod rest;

// Re-export main components
pub use assets::PoloniexAssetResolver;
pub use builder::{build_connector, PoloniexBuilder};
pub use connector::PoloniexConnector;
pub use pricing::PoloniexPriceOracle;
pub use rest::{PoloniexRestClient, DEFAULT_BASE_URL, PUBLIC_API_ENDPOINTS};
pub use signer::PoloniexSigner;
