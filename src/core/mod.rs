pub mod config;
pub mod deserialize;
pub mod errors;
pub mod kernel;
pub mod messages;
pub mod pricing;
pub mod traits;
pub mod types;
