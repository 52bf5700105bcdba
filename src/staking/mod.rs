use futures::StreamExt;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinSet, time::timeout};
use tokio_util::sync::CancellationToken;

use crate::error::SetupFailure;
use crate::metrics;
use crate::networks::NetworkDescriptor;
use crate::registry::{ClientRegistry, LedgerStream, LedgerTick, NetworkClient};
use crate::routing::route_addresses;
use crate::units::{format_balance, normalize_balance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Pending,
    Ready,
    Error,
    Cached,
}

/// Staked balance of all routed addresses on one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingAggregate {
    pub name: String,
    pub chain_id: String,
    pub balance: String,
    pub native_token: String,
    pub unit: String,
    pub state: ItemState,
}

impl StakingAggregate {
    pub fn pending(network: &NetworkDescriptor) -> Self {
        Self {
            name: network.display_name.clone(),
            chain_id: network.key.clone(),
            balance: "0".to_string(),
            native_token: network.native_token.clone(),
            unit: network.native_token.clone(),
            state: ItemState::Pending,
        }
    }

    /// Folds one tick into this aggregate. Returns false when nothing needs
    /// reporting: the tick carried no ledger data and no balance was reported
    /// before it.
    pub fn apply_tick(&mut self, network: &NetworkDescriptor, tick: &LedgerTick) -> bool {
        let snapshots: Vec<_> = tick
            .iter()
            .filter_map(|raw| network.family.decode_ledger(raw))
            .collect();
        if snapshots.is_empty() {
            if self.state == ItemState::Pending {
                return false;
            }
            // Fully unbonded since the last report
            self.balance = "0".to_string();
            self.unit = network.native_token.clone();
            self.state = ItemState::Ready;
            return true;
        }

        let mut total = 0.0;
        let mut unit = None;
        for snapshot in snapshots.iter().filter(|s| !s.active.is_empty()) {
            let normalized = normalize_balance(&snapshot.active, network.decimals, &network.native_token);
            total += normalized.value;
            unit = Some(normalized.unit);
        }

        self.balance = format_balance(total);
        self.unit = unit.unwrap_or_else(|| network.native_token.clone());
        self.state = ItemState::Ready;
        true
    }
}

pub type OnUpdate = Arc<dyn Fn(&str, StakingAggregate) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct StakingOptions {
    /// How long to wait for a client to become ready. `None` waits forever.
    pub ready_timeout: Option<Duration>,
}


/// Live staking subscriptions across networks.
///
/// `cancel` stops every per-network task and waits for them to release their
/// ledger streams. Dropping the handle aborts the tasks.
pub struct StakingSubscription {
    token: CancellationToken,
    tasks: Mutex<Option<JoinSet<()>>>,
    networks: Vec<String>,
}

impl StakingSubscription {
    /// Network keys a task was started for.
    pub fn networks(&self) -> &[String] {
        &self.networks
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Safe to call more than once; later calls return immediately.
    pub async fn cancel(&self) {
        let Some(mut tasks) = self.tasks.lock().await.take() else {
            return;
        };

        self.token.cancel();
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!("Staking task panicked: {}", e);
                }
            }
        }
        info!("Cancelled staking subscriptions for {} networks", self.networks.len());
    }
}

impl Drop for StakingSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Subscribes to staking ledgers on every network in `networks`.
///
/// Must be called from within a tokio runtime. Each network runs in its own
/// task, so a client that fails or never becomes ready only silences that
/// network.
pub fn subscribe_staking(
    addresses: &[String],
    clients: &ClientRegistry,
    on_update: OnUpdate,
    networks: &[NetworkDescriptor],
) -> StakingSubscription {
    subscribe_staking_with(addresses, clients, on_update, networks, StakingOptions::default())
}

pub fn subscribe_staking_with(
    addresses: &[String],
    clients: &ClientRegistry,
    on_update: OnUpdate,
    networks: &[NetworkDescriptor],
    options: StakingOptions,
) -> StakingSubscription {
    let routed = route_addresses(addresses);
    let token = CancellationToken::new();
    let mut tasks = JoinSet::new();
    let mut started = Vec::new();

    for network in networks {
        let addresses = routed.for_family(network.family).to_vec();
        if addresses.is_empty() {
            debug!("No {:?} addresses for {}, skipping", network.family, network.key);
            continue;
        }

        started.push(network.key.clone());
        tasks.spawn(run_network(
            network.clone(),
            clients.get(&network.key),
            addresses,
            on_update.clone(),
            options.ready_timeout,
            token.child_token(),
        ));
    }

    info!("Started staking subscriptions for {:?}", started);

    StakingSubscription {
        token,
        tasks: Mutex::new(Some(tasks)),
        networks: started,
    }
}

async fn run_network(
    network: NetworkDescriptor,
    client: Option<Arc<dyn NetworkClient>>,
    addresses: Vec<String>,
    on_update: OnUpdate,
    ready_timeout: Option<Duration>,
    token: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        opened = open_subscription(&network, client, addresses, ready_timeout) => opened,
    };

    let mut ledgers = match opened {
        Ok(ledgers) => ledgers,
        Err(failure) => {
            warn!("{}", failure);
            metrics::record_setup_failure(&network.key);
            return;
        }
    };

    let mut aggregate = StakingAggregate::pending(&network);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            tick = ledgers.next() => match tick {
                Some(tick) => {
                    if aggregate.apply_tick(&network, &tick) {
                        metrics::record_staking_tick(&network.key);
                        on_update(&network.key, aggregate.clone());
                    }
                }
                None => {
                    debug!("Ledger stream for {} ended", network.key);
                    break;
                }
            },
        }
    }
}

async fn open_subscription(
    network: &NetworkDescriptor,
    client: Option<Arc<dyn NetworkClient>>,
    addresses: Vec<String>,
    ready_timeout: Option<Duration>,
) -> Result<LedgerStream, SetupFailure> {
    let client = client.ok_or_else(|| SetupFailure::new(&network.key, "no client registered"))?;

    let ready = match ready_timeout {
        Some(limit) => timeout(limit, client.ready())
            .await
            .map_err(|_| SetupFailure::new(&network.key, format!("not ready after {:?}", limit)))?,
        None => client.ready().await,
    };
    ready.map_err(|e| SetupFailure::new(&network.key, e))?;

    client
        .subscribe_ledgers(addresses)
        .await
        .map_err(|e| SetupFailure::new(&network.key, e))
}
