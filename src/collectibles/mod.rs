pub mod sources;
pub mod types;

use futures::future::join_all;
use log::{info, warn};
use std::{collections::HashMap, sync::Arc, time::Instant};

use crate::assembler::{distinct_keys, group_by};
use crate::config::{AggregatorConfig, FailurePolicy, COLLECTION_SOURCE_NAME};
use crate::error::{AggregationError, ConfigError, SourceFetchFailure};
use crate::metrics;

pub use sources::{CollectionResolver, HttpCollectionResolver, HttpItemSource, ItemSource};
pub use types::{AggregationResult, CollectibleItem, CollectionAggregate, CollectionInfo, RawItem};

/// Fetches collectibles from every item source and groups them by collection.
pub struct CollectibleAggregator {
    sources: Vec<Arc<dyn ItemSource>>,
    resolver: Arc<dyn CollectionResolver>,
    policy: FailurePolicy,
}

impl CollectibleAggregator {
    pub fn new(sources: Vec<Arc<dyn ItemSource>>, resolver: Arc<dyn CollectionResolver>) -> Self {
        Self {
            sources,
            resolver,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds HTTP sources sharing one client from a validated config.
    pub fn from_config(config: &AggregatorConfig) -> Result<Self, ConfigError> {
        config.validate_all()?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| ConfigError::InvalidValue("http_client", e.to_string()))?;

        let sources = config
            .item_sources
            .iter()
            .map(|source| {
                Arc::new(HttpItemSource::new(&source.name, &source.endpoint, client.clone()))
                    as Arc<dyn ItemSource>
            })
            .collect();
        let resolver = Arc::new(HttpCollectionResolver::new(
            COLLECTION_SOURCE_NAME,
            &config.collection_endpoint,
            client,
        ));

        Ok(Self::new(sources, resolver).with_policy(config.failure_policy))
    }

    /// Snapshot of everything `address` owns.
    ///
    /// Items are fetched from all sources at once, then collection names from
    /// one request per distinct collection URL. An empty address yields an
    /// empty result without touching the network.
    pub async fn fetch_all(&self, address: &str) -> Result<AggregationResult, AggregationError> {
        if address.trim().is_empty() {
            return Ok(AggregationResult::default());
        }
        let start = Instant::now();

        let (items, failed_sources) = self.fetch_items(address).await?;
        let names = self.resolve_names(&items).await?;

        let total = items.len();
        let collections = group_by(items.into_iter().map(CollectibleItem::from), |item| {
            item.collection_id.clone()
        })
        .into_iter()
        .map(|(collection_id, nft_items)| CollectionAggregate {
            collection_name: names.get(&collection_id).cloned().flatten(),
            collection_id,
            nft_items,
        })
        .collect::<Vec<_>>();

        metrics::record_fetch(total, start.elapsed());
        info!(
            "Fetched {} collectibles in {} collections for {} in {:?}",
            total,
            collections.len(),
            address,
            start.elapsed()
        );

        Ok(AggregationResult {
            total,
            collections,
            failed_sources,
        })
    }

    async fn fetch_items(
        &self,
        address: &str,
    ) -> Result<(Vec<RawItem>, Vec<String>), AggregationError> {
        let fetches = self
            .sources
            .iter()
            .map(|source| async move { source.fetch_items(address).await });
        let results = join_all(fetches).await;

        let mut items = Vec::new();
        let mut failures: Vec<SourceFetchFailure> = Vec::new();
        for result in results {
            match result {
                Ok(batch) => items.extend(batch),
                Err(failure) => {
                    warn!("{}", failure);
                    metrics::record_source_failure(&failure.source_name);
                    if self.policy == FailurePolicy::FailFast {
                        return Err(failure.into());
                    }
                    failures.push(failure);
                }
            }
        }

        if !self.sources.is_empty() && failures.len() == self.sources.len() {
            return Err(AggregationError::AllSourcesFailed(failures));
        }

        let failed_sources = failures.into_iter().map(|f| f.source_name).collect();
        Ok((items, failed_sources))
    }

    async fn resolve_names(
        &self,
        items: &[RawItem],
    ) -> Result<HashMap<String, Option<String>>, AggregationError> {
        let collection_ids = distinct_keys(items, |item| item.collection_id.clone());
        let by_url = group_by(collection_ids, |id| self.resolver.collection_url(id));

        let lookups = by_url
            .keys()
            .map(|url| async move { self.resolver.fetch_collection(url).await });
        let results = join_all(lookups).await;

        let mut names = HashMap::new();
        for ((url, ids), result) in by_url.into_iter().zip(results) {
            let name = match result {
                Ok(info) => info.and_then(|info| info.name),
                Err(failure) => {
                    warn!("Collection lookup {} failed: {}", url, failure);
                    metrics::record_source_failure(&failure.source_name);
                    if self.policy == FailurePolicy::FailFast {
                        return Err(failure.into());
                    }
                    None
                }
            };
            for id in ids {
                names.insert(id, name.clone());
            }
        }

        Ok(names)
    }
}
