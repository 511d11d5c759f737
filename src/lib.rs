pub mod core;
pub mod exchanges;
pub mod utils;

pub use core::{errors::ExchangeError, traits::ExchangeInterface, types::*};
pub use exchanges::poloniex::{PoloniexBuilder, PoloniexConnector};
