use thiserror::Error;

/// A network whose client could not be brought up or subscribed.
///
/// Setup failures stay inside the per-network task: they are logged and
/// counted, never returned to the caller of `subscribe_staking`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("staking setup failed for {network}: {reason}")]
pub struct SetupFailure {
    pub network: String,
    pub reason: String,
}

impl SetupFailure {
    pub fn new(network: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            network: network.into(),
            reason: reason.to_string(),
        }
    }
}

/// An item or collection source that rejected a request.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("source {source_name} failed: {reason}")]
pub struct SourceFetchFailure {
    pub source_name: String,
    pub reason: String,
}

impl SourceFetchFailure {
    pub fn new(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("all {} collectible sources failed", .0.len())]
    AllSourcesFailed(Vec<SourceFetchFailure>),

    #[error(transparent)]
    Source(#[from] SourceFetchFailure),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid endpoint {0}: {1}")]
    InvalidEndpoint(String, String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("no item sources configured")]
    NoSources,

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Errors reported by a network client handle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("client never became ready: {0}")]
    NotReady(String),

    #[error("ledger subscription rejected: {0}")]
    Subscription(String),

    #[error("network does not expose staking ledgers")]
    StakingUnsupported,
}
