use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};
use url::Url;

use crate::error::ConfigError;

pub const SINGULAR_ACCOUNT_ENDPOINT: &str = "https://singular.rmrk.app/api/rmrk1/account/";
pub const KANARIA_BIRDS_ENDPOINT: &str = "https://kanaria.rmrk.app/api/rmrk1/account-birds/";
pub const KANARIA_ITEMS_ENDPOINT: &str = "https://kanaria.rmrk.app/api/rmrk1/account-items/";
pub const SINGULAR_COLLECTION_ENDPOINT: &str = "https://singular.rmrk.app/api/rmrk1/collection/";

// Label for collection lookups in failures and metrics
pub const COLLECTION_SOURCE_NAME: &str = "singular-collections";

/// What a collectible fetch does when one of its sources rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Drop the failed source and report it alongside the result.
    #[default]
    Isolate,
    /// Fail the whole call on the first rejected request.
    FailFast,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            other => Err(ConfigError::InvalidValue("failure_policy", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSourceConfig {
    pub name: String,
    pub endpoint: String,
}

impl ItemSourceConfig {
    pub fn new(name: &str, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    // Collectibles
    pub item_sources: Vec<ItemSourceConfig>,
    pub collection_endpoint: String,
    pub failure_policy: FailurePolicy,
    pub http_timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            item_sources: vec![
                ItemSourceConfig::new("singular", SINGULAR_ACCOUNT_ENDPOINT),
                ItemSourceConfig::new("kanaria-birds", KANARIA_BIRDS_ENDPOINT),
                ItemSourceConfig::new("kanaria-items", KANARIA_ITEMS_ENDPOINT),
            ],
            collection_endpoint: SINGULAR_COLLECTION_ENDPOINT.to_string(),
            failure_policy: FailurePolicy::default(),
            http_timeout_secs: 20,
        }
    }
}

impl AggregatorConfig {
    /// Reads `AGGREGATOR_*` variables (after loading `.env`) over the defaults.
    ///
    /// `AGGREGATOR_ITEM_SOURCES` takes comma separated `name=endpoint` pairs.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(sources) = env::var("AGGREGATOR_ITEM_SOURCES") {
            config.item_sources = parse_sources(&sources)?;
        }
        if let Ok(endpoint) = env::var("AGGREGATOR_COLLECTION_ENDPOINT") {
            config.collection_endpoint = endpoint;
        }
        if let Ok(policy) = env::var("AGGREGATOR_FAILURE_POLICY") {
            config.failure_policy = policy.parse()?;
        }
        if let Ok(secs) = env::var("AGGREGATOR_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = parse_secs("http_timeout_secs", &secs)?;
        }

        Ok(config)
    }

    pub fn validate_all(&self) -> Result<(), ConfigError> {
        if self.item_sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for source in &self.item_sources {
            validate_endpoint(&source.endpoint)?;
        }
        validate_endpoint(&self.collection_endpoint)?;

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("http_timeout_secs"));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_sources(raw: &str) -> Result<Vec<ItemSourceConfig>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, endpoint) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidValue("item_sources", entry.to_string()))?;
            Ok(ItemSourceConfig::new(name.trim(), endpoint.trim()))
        })
        .collect()
}

fn parse_secs(field: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(field, raw.to_string()))
}

// Custom validators
fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidEndpoint(endpoint.to_string(), e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidEndpoint(
            endpoint.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AggregatorConfig::default();
        assert!(config.validate_all().is_ok());
        assert_eq!(config.item_sources.len(), 3);
    }

    #[test]
    fn rejects_bad_endpoints_and_timeouts() {
        let mut config = AggregatorConfig::default();
        config.collection_endpoint = "ws://singular.rmrk.app/".to_string();
        assert!(matches!(config.validate_all(), Err(ConfigError::InvalidEndpoint(..))));

        let mut config = AggregatorConfig::default();
        config.http_timeout_secs = 0;
        assert!(matches!(config.validate_all(), Err(ConfigError::ZeroTimeout(_))));

        let mut config = AggregatorConfig::default();
        config.item_sources.clear();
        assert!(matches!(config.validate_all(), Err(ConfigError::NoSources)));
    }

    #[test]
    fn parses_source_list() {
        let sources = parse_sources("a=https://a.example/items/, b = https://b.example/").unwrap();
        assert_eq!(sources[0], ItemSourceConfig::new("a", "https://a.example/items/"));
        assert_eq!(sources[1].name, "b");
        assert!(parse_sources("missing-endpoint").is_err());
    }

    #[test]
    fn parses_failure_policy() {
        assert_eq!("fail-fast".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailFast);
        assert_eq!(" Isolate ".parse::<FailurePolicy>().unwrap(), FailurePolicy::Isolate);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
