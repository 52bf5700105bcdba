pub mod assembler;
pub mod collectibles;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod networks;
pub mod registry;
pub mod routing;     // Address family routing
pub mod staking;
pub mod units;

pub use collectibles::{AggregationResult, CollectibleAggregator};
pub use error::{AggregationError, ClientError, SetupFailure, SourceFetchFailure};
pub use networks::{default_staking_networks, AddressFamily, NetworkDescriptor};
pub use registry::{ClientRegistry, NetworkClient};
pub use staking::{subscribe_staking, StakingAggregate, StakingSubscription};

/// Fetches every collectible `address` owns with the default sources.
pub async fn get_all_collectibles_by_account(address: &str) -> anyhow::Result<AggregationResult> {
    let aggregator = CollectibleAggregator::from_config(&config::AggregatorConfig::default())?;
    Ok(aggregator.fetch_all(address).await?)
}
