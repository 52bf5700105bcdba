use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use test_log::test;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

use chain_aggregator::{
    error::ClientError,
    networks::{lookup, NetworkDescriptor},
    registry::{ClientRegistry, LedgerStream, LedgerTick, NetworkClient},
    staking::{
        subscribe_staking, subscribe_staking_with, ItemState, OnUpdate, StakingAggregate, StakingOptions,
    },
};

const DOT_ADDRESS: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";
const EVM_ADDRESS: &str = "0x6Be02d1d3665660d22FF9624b7BE0551ee1Ac91b";

#[derive(Clone, Copy)]
enum Readiness {
    Ready,
    After(Duration),
    Never,
    Fails,
}

struct Unsubscribe(Arc<AtomicUsize>);

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeClient {
    readiness: Readiness,
    ticks: Mutex<Option<UnboundedReceiver<LedgerTick>>>,
    subscribed_with: Mutex<Vec<Vec<String>>>,
    unsubscribed: Arc<AtomicUsize>,
}

impl FakeClient {
    fn new(readiness: Readiness) -> (Arc<Self>, UnboundedSender<LedgerTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            readiness,
            ticks: Mutex::new(Some(rx)),
            subscribed_with: Mutex::new(Vec::new()),
            unsubscribed: Arc::new(AtomicUsize::new(0)),
        });
        (client, tx)
    }

    fn subscriptions(&self) -> Vec<Vec<String>> {
        self.subscribed_with.lock().unwrap().clone()
    }

    fn unsubscribes(&self) -> usize {
        self.unsubscribed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkClient for FakeClient {
    async fn ready(&self) -> Result<(), ClientError> {
        match self.readiness {
            Readiness::Ready => Ok(()),
            Readiness::After(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Readiness::Never => futures::future::pending().await,
            Readiness::Fails => Err(ClientError::NotReady("connection refused".to_string())),
        }
    }

    async fn subscribe_ledgers(&self, addresses: Vec<String>) -> Result<LedgerStream, ClientError> {
        self.subscribed_with.lock().unwrap().push(addresses);
        let rx = self
            .ticks
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ClientError::Subscription("already subscribed".to_string()))?;

        let guard = Unsubscribe(self.unsubscribed.clone());
        Ok(UnboundedReceiverStream::new(rx)
            .map(move |tick| {
                let _subscribed = &guard;
                tick
            })
            .boxed())
    }
}

type Updates = UnboundedReceiver<(String, StakingAggregate)>;

fn collector() -> (OnUpdate, Updates) {
    let (tx, rx) = mpsc::unbounded_channel();
    let on_update: OnUpdate = Arc::new(move |network: &str, aggregate: StakingAggregate| {
        let _ = tx.send((network.to_string(), aggregate));
    });
    (on_update, rx)
}

async fn next_update(updates: &mut Updates) -> (String, StakingAggregate) {
    tokio::time::timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("timed out waiting for staking update")
        .expect("update channel closed")
}

fn networks(keys: &[&str]) -> Vec<NetworkDescriptor> {
    keys.iter().map(|key| lookup(key).unwrap().clone()).collect()
}

#[test(tokio::test)]
async fn scales_ledger_and_skips_silent_network() -> Result<()> {
    let (polkadot, polkadot_tx) = FakeClient::new(Readiness::Ready);
    let (kusama, _kusama_tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new()
        .with_client("polkadot", polkadot.clone())
        .with_client("kusama", kusama.clone());
    let (on_update, mut updates) = collector();

    polkadot_tx.send(vec![json!({ "stash": DOT_ADDRESS, "active": "1,000 DOT" })])?;
    let subscription = subscribe_staking(
        &[DOT_ADDRESS.to_string()],
        &registry,
        on_update,
        &networks(&["polkadot", "kusama"]),
    );

    let (network, aggregate) = next_update(&mut updates).await;
    assert_eq!(network, "polkadot");
    assert_eq!(aggregate.balance, "0.0000001");
    assert_eq!(aggregate.unit, "DOT");
    assert_eq!(aggregate.name, "Polkadot Relay Chain");
    assert_eq!(aggregate.state, ItemState::Ready);

    while kusama.subscriptions().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    subscription.cancel().await;
    assert!(updates.try_recv().is_err());
    assert_eq!(kusama.subscriptions(), vec![vec![DOT_ADDRESS.to_string()]]);

    Ok(())
}

#[test(tokio::test)]
async fn ticks_arrive_in_transport_order() -> Result<()> {
    let (client, tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new().with_client("kusama", client);
    let (on_update, mut updates) = collector();

    let subscription = subscribe_staking(&[DOT_ADDRESS.to_string()], &registry, on_update, &networks(&["kusama"]));
    for active in ["1,000,000,000,000 KSM", "2,000,000,000,000 KSM", "0"] {
        tx.send(vec![json!({ "active": active })])?;
    }

    let balances: Vec<String> = vec![
        next_update(&mut updates).await.1.balance,
        next_update(&mut updates).await.1.balance,
        next_update(&mut updates).await.1.balance,
    ];
    assert_eq!(balances, vec!["1", "2", "0"]);

    subscription.cancel().await;
    Ok(())
}

#[test(tokio::test)]
async fn failed_network_does_not_block_siblings() -> Result<()> {
    let (broken, _broken_tx) = FakeClient::new(Readiness::Fails);
    let (stuck, _stuck_tx) = FakeClient::new(Readiness::Never);
    let (healthy, healthy_tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new()
        .with_client("kusama", broken.clone())
        .with_client("hydradx", stuck.clone())
        .with_client("polkadot", healthy);
    let (on_update, mut updates) = collector();

    let subscription = subscribe_staking_with(
        &[DOT_ADDRESS.to_string()],
        &registry,
        on_update,
        // acala has no registered client at all
        &networks(&["kusama", "hydradx", "acala", "polkadot"]),
        StakingOptions { ready_timeout: None },
    );
    healthy_tx.send(vec![json!({ "active": "20,000,000,000 DOT" })])?;

    let (network, aggregate) = next_update(&mut updates).await;
    assert_eq!(network, "polkadot");
    assert_eq!(aggregate.balance, "2");

    // Cancelling unwinds the network still waiting for readiness
    tokio::time::timeout(Duration::from_secs(2), subscription.cancel()).await?;
    assert!(broken.subscriptions().is_empty());
    assert!(stuck.subscriptions().is_empty());
    assert!(updates.try_recv().is_err());

    Ok(())
}

#[test(tokio::test)]
async fn ready_timeout_gives_up_quietly() -> Result<()> {
    let (stuck, _tx) = FakeClient::new(Readiness::Never);
    let registry = ClientRegistry::new().with_client("polkadot", stuck.clone());
    let (on_update, mut updates) = collector();

    let subscription = subscribe_staking_with(
        &[DOT_ADDRESS.to_string()],
        &registry,
        on_update,
        &networks(&["polkadot"]),
        StakingOptions {
            ready_timeout: Some(Duration::from_millis(20)),
        },
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    subscription.cancel().await;
    assert!(stuck.subscriptions().is_empty());
    assert!(updates.try_recv().is_err());
    Ok(())
}

#[test(tokio::test)]
async fn cancel_is_idempotent() -> Result<()> {
    let (polkadot, _polkadot_tx) = FakeClient::new(Readiness::Ready);
    let (kusama, _kusama_tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new()
        .with_client("polkadot", polkadot.clone())
        .with_client("kusama", kusama.clone());
    let (on_update, _updates) = collector();

    let subscription = subscribe_staking(
        &[DOT_ADDRESS.to_string()],
        &registry,
        on_update,
        &networks(&["polkadot", "kusama"]),
    );
    // Let both tasks open their streams
    while polkadot.subscriptions().is_empty() || kusama.subscriptions().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    subscription.cancel().await;
    subscription.cancel().await;

    assert!(subscription.is_cancelled());
    assert_eq!(polkadot.unsubscribes(), 1);
    assert_eq!(kusama.unsubscribes(), 1);
    Ok(())
}

#[test(tokio::test)]
async fn contract_networks_get_evm_addresses_only() -> Result<()> {
    let (moonbeam, moonbeam_tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new().with_client("moonbeam", moonbeam.clone());
    let (on_update, mut updates) = collector();

    let subscription = subscribe_staking(
        &[DOT_ADDRESS.to_string(), EVM_ADDRESS.to_string()],
        &registry,
        on_update,
        &networks(&["moonbeam"]),
    );
    moonbeam_tx.send(vec![json!({
        "id": EVM_ADDRESS,
        "total": "3,000,000,000,000,000,000 GLMR",
        "delegations": []
    })])?;

    let (network, aggregate) = next_update(&mut updates).await;
    assert_eq!(network, "moonbeam");
    assert_eq!(aggregate.balance, "3");
    assert_eq!(aggregate.unit, "GLMR");
    assert_eq!(moonbeam.subscriptions(), vec![vec![EVM_ADDRESS.to_string()]]);

    subscription.cancel().await;
    Ok(())
}

#[test(tokio::test)]
async fn networks_without_matching_addresses_are_not_started() -> Result<()> {
    let (moonbeam, _tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new().with_client("moonbeam", moonbeam.clone());
    let (on_update, _updates) = collector();

    let subscription = subscribe_staking(
        &[DOT_ADDRESS.to_string()],
        &registry,
        on_update,
        &networks(&["moonbeam"]),
    );

    assert!(subscription.networks().is_empty());
    subscription.cancel().await;
    assert!(moonbeam.subscriptions().is_empty());
    Ok(())
}

#[test(tokio::test)]
async fn empty_ticks_do_not_call_back() -> Result<()> {
    let (client, tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new().with_client("polkadot", client);
    let (on_update, mut updates) = collector();

    let subscription = subscribe_staking(&[DOT_ADDRESS.to_string()], &registry, on_update, &networks(&["polkadot"]));
    tx.send(vec![json!(null)])?;
    tx.send(vec![json!({ "active": "" })])?;

    let (_, aggregate) = next_update(&mut updates).await;
    assert_eq!(aggregate.balance, "0");
    assert_eq!(aggregate.state, ItemState::Ready);

    subscription.cancel().await;
    assert!(updates.try_recv().is_err());
    Ok(())
}

#[test(tokio::test)]
async fn full_unbond_reports_zero() -> Result<()> {
    let (client, tx) = FakeClient::new(Readiness::Ready);
    let registry = ClientRegistry::new().with_client("polkadot", client);
    let (on_update, mut updates) = collector();

    let subscription = subscribe_staking(&[DOT_ADDRESS.to_string()], &registry, on_update, &networks(&["polkadot"]));
    tx.send(vec![json!({ "stash": DOT_ADDRESS, "active": "20,000,000,000 DOT" })])?;
    tx.send(vec![json!(null)])?;

    let (_, staked) = next_update(&mut updates).await;
    assert_eq!(staked.balance, "2");

    let (network, unbonded) = next_update(&mut updates).await;
    assert_eq!(network, "polkadot");
    assert_eq!(unbonded.balance, "0");
    assert_eq!(unbonded.unit, "DOT");
    assert_eq!(unbonded.state, ItemState::Ready);

    subscription.cancel().await;
    Ok(())
}

#[test(tokio::test(start_paused = true))]
async fn late_ready_client_still_emits() -> Result<()> {
    let (late, tx) = FakeClient::new(Readiness::After(Duration::from_secs(45)));
    let registry = ClientRegistry::new().with_client("kusama", late.clone());
    let (on_update, mut updates) = collector();

    let subscription = subscribe_staking(&[DOT_ADDRESS.to_string()], &registry, on_update, &networks(&["kusama"]));
    tx.send(vec![json!({ "active": "3,000,000,000,000 KSM" })])?;

    let (network, aggregate) = tokio::time::timeout(Duration::from_secs(120), updates.recv())
        .await?
        .expect("update channel closed");
    assert_eq!(network, "kusama");
    assert_eq!(aggregate.balance, "3");
    assert_eq!(late.subscriptions(), vec![vec![DOT_ADDRESS.to_string()]]);

    subscription.cancel().await;
    Ok(())
}
