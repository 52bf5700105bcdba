use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

use super::types::{CollectionInfo, RawItem};
use crate::error::SourceFetchFailure;

/// An indexer that lists the items an address owns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemSource: Send + Sync {
    fn name(&self) -> String;

    async fn fetch_items(&self, address: &str) -> Result<Vec<RawItem>, SourceFetchFailure>;
}

/// Resolves collection ids to display names.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionResolver: Send + Sync {
    /// Request URL for a collection; equal URLs are fetched once.
    fn collection_url(&self, collection_id: &str) -> String;

    /// `Ok(None)` when the endpoint knows nothing about the collection.
    async fn fetch_collection(&self, url: &str) -> Result<Option<CollectionInfo>, SourceFetchFailure>;
}

pub struct HttpItemSource {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpItemSource {
    pub fn new(name: &str, endpoint: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            client,
        }
    }

    fn failure(&self, reason: impl ToString) -> SourceFetchFailure {
        SourceFetchFailure::new(&self.name, reason)
    }
}

#[async_trait]
impl ItemSource for HttpItemSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn fetch_items(&self, address: &str) -> Result<Vec<RawItem>, SourceFetchFailure> {
        let url = format!("{}{}", self.endpoint, address);
        debug!("Fetching items from {}", url);

        let records: Vec<Value> = get_json(&self.client, &url)
            .await
            .map_err(|e| self.failure(e))?;

        let items = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<RawItem>(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("{}: skipping malformed item record: {}", self.name, e);
                    None
                }
            })
            .collect();

        Ok(items)
    }
}

pub struct HttpCollectionResolver {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpCollectionResolver {
    pub fn new(name: &str, endpoint: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            client,
        }
    }
}

#[async_trait]
impl CollectionResolver for HttpCollectionResolver {
    fn collection_url(&self, collection_id: &str) -> String {
        format!("{}{}", self.endpoint, collection_id)
    }

    async fn fetch_collection(&self, url: &str) -> Result<Option<CollectionInfo>, SourceFetchFailure> {
        let records: Vec<CollectionInfo> = get_json(&self.client, url)
            .await
            .map_err(|e| SourceFetchFailure::new(&self.name, e))?;

        Ok(records.into_iter().next())
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, reqwest::Error> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<T>()
        .await
}
