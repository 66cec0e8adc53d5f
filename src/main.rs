mod config;
mod models;
mod services;
mod sources;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use services::Gatherer;
use sources::graphql::SubgraphClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,subgraph_gatherer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("✓ Configuration loaded ({} exchanges)", config.exchanges.len());

    // Optional positional argument narrows the run to one exchange.
    let args: Vec<String> = std::env::args().collect();
    let selected: Vec<config::ExchangeConfig> = match args.get(1) {
        Some(name) => vec![config
            .exchange(name)
            .ok_or_else(|| format!("unknown exchange `{}` in config.toml", name))?
            .clone()],
        None => config.exchanges.clone(),
    };

    for entry in selected {
        let Some(exchange) = sources::exchange_by_name(&entry.name) else {
            tracing::warn!("No adapter for `{}`, skipping", entry.name);
            continue;
        };

        let client = Arc::new(SubgraphClient::new(
            entry.url.clone(),
            config.http.timeout_secs,
        ));
        let report = Gatherer::new(exchange, client).gather().await?;

        if let Some(last) = report.pool_counts.last() {
            tracing::info!(
                "{}: {} pools in total as of {}",
                report.exchange,
                last.total_count,
                last.date
            );
        }
        if let Some(last) = report.token_counts.last() {
            tracing::info!("{}: {} tokens deployed", report.exchange, last.total_count);
        }
        if let Some(last) = report.swaps_daily.last() {
            tracing::info!("{}: {} swaps in total", report.exchange, last.total_swap_count);
        }
        if let Some(last) = report.exchange_day.last() {
            tracing::info!(
                "{}: ${:.0} cumulative volume through {}",
                report.exchange,
                last.day.total_volume_usd,
                last.day.date
            );
        }
    }

    Ok(())
}
