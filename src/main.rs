use anyhow::{anyhow, Result};
use log::{error, info};

use chain_aggregator::{
    collectibles::CollectibleAggregator, config::AggregatorConfig, logging::setup_logger,
    routing::classify_address,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    dotenv::dotenv().ok();
    setup_logger()?;

    let address = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: chain-aggregator <address>"))?;

    // Load and validate configurations
    let config = AggregatorConfig::from_env()?;
    config.validate_all()?;

    info!(
        "Fetching collectibles for {} ({:?}) from {} sources",
        address,
        classify_address(&address),
        config.item_sources.len()
    );

    let aggregator = CollectibleAggregator::from_config(&config)?;
    match aggregator.fetch_all(&address).await {
        Ok(result) => {
            for source in &result.failed_sources {
                error!("Source {} failed, results are partial", source);
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => Err(anyhow!("Failed to fetch collectibles: {}", e)),
    }
}
