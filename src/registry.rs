use async_trait::async_trait;
use futures::stream::BoxStream;
use std::{collections::HashMap, sync::Arc};

use crate::error::ClientError;

/// One tick of a multi-address ledger subscription: a raw human-readable
/// ledger per subscribed address, `null` where the address has none.
pub type LedgerTick = Vec<serde_json::Value>;

/// Ticks in transport order. Dropping the stream unsubscribes.
pub type LedgerStream = BoxStream<'static, LedgerTick>;

/// A connected chain client owned by the connectivity layer.
///
/// Handles may be shared by any number of subscribers; nothing here
/// reconnects or closes them.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Resolves once the connection can serve queries.
    async fn ready(&self) -> Result<(), ClientError>;

    /// Opens `staking.ledger` over all `addresses` at once.
    async fn subscribe_ledgers(&self, addresses: Vec<String>) -> Result<LedgerStream, ClientError>;
}

/// Read-only lookup from network key to client handle.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn NetworkClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, network: &str, client: Arc<dyn NetworkClient>) -> Self {
        self.insert(network, client);
        self
    }

    pub fn insert(&mut self, network: &str, client: Arc<dyn NetworkClient>) {
        self.clients.insert(network.to_string(), client);
    }

    pub fn get(&self, network: &str) -> Option<Arc<dyn NetworkClient>> {
        self.clients.get(network).cloned()
    }
}
