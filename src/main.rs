use anyhow::Context;
use chrono::{Duration, Utc};
use ledgerx::core::config::ExchangeConfig;
use ledgerx::core::messages::MessagesAggregator;
use ledgerx::{ExchangeInterface, PoloniexBuilder};
use std::sync::Arc;
use tracing::info;

const DEFAULT_SYNC_DAYS: i64 = 30;

fn load_config() -> anyhow::Result<ExchangeConfig> {
    #[cfg(feature = "env-file")]
    let config = ExchangeConfig::from_env_file("POLONIEX");
    #[cfg(not(feature = "env-file"))]
    let config = ExchangeConfig::from_env("POLONIEX");

    config.context("Poloniex credentials are required (POLONIEX_API_KEY, POLONIEX_SECRET_KEY)")
}

fn print_json_line<T: serde::Serialize>(kind: &str, record: &T) -> anyhow::Result<()> {
    let value = serde_json::json!({ "kind": kind, "record": record });
    println!("{}", serde_json::to_string(&value)?);
    Ok(())
}

/// Sync a Poloniex account and print every record as one JSON line
///
/// Usage: `ledgerx [days]`, defaulting to the last 30 days.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let days = match std::env::args().nth(1) {
        Some(raw) => raw
            .parse::<i64>()
            .with_context(|| format!("invalid number of days: {}", raw))?,
        None => DEFAULT_SYNC_DAYS,
    };
    let end = Utc::now();
    let start = end - Duration::days(days);

    let messages = Arc::new(MessagesAggregator::new());
    let poloniex = PoloniexBuilder::new()
        .with_config(load_config()?)
        .with_messages(messages.clone())
        .build()?;

    let (valid, reason) = poloniex.validate_api_key().await?;
    if !valid {
        anyhow::bail!(reason);
    }

    info!(start = %start, end = %end, "Syncing poloniex history");

    match poloniex.query_balances().await {
        (Some(balances), _) => {
            for (asset, balance) in &balances {
                print_json_line("balance", &serde_json::json!({ "asset": asset, "balance": balance }))?;
            }
        }
        (None, msg) => eprintln!("balances unavailable: {}", msg),
    }

    for trade in poloniex
        .query_trades(start.timestamp(), end.timestamp())
        .await?
    {
        print_json_line("trade", &trade)?;
    }

    for movement in poloniex
        .query_history_events(start.timestamp(), end.timestamp())
        .await?
    {
        print_json_line("asset_movement", &movement)?;
    }

    for warning in messages.consume_warnings() {
        eprintln!("warning: {}", warning);
    }
    for error in messages.consume_errors() {
        eprintln!("error: {}", error);
    }

    Ok(())
}
