use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ledger::LedgerSnapshot;

/// Structural class of a wallet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// SS58 account ids (substrate style).
    Account,
    /// 20-byte hex addresses (EVM style).
    Contract,
}

impl AddressFamily {
    /// Decodes one raw ledger entry with the schema this family's networks reply with.
    pub fn decode_ledger(&self, raw: &serde_json::Value) -> Option<LedgerSnapshot> {
        match self {
            AddressFamily::Account => LedgerSnapshot::from_account_ledger(raw),
            AddressFamily::Contract => LedgerSnapshot::from_delegator_state(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub key: String,
    pub display_name: String,
    pub native_token: String,
    pub decimals: u32,
    pub family: AddressFamily,
}

impl NetworkDescriptor {
    pub fn new(
        key: &str,
        display_name: &str,
        native_token: &str,
        decimals: u32,
        family: AddressFamily,
    ) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            native_token: native_token.to_string(),
            decimals,
            family,
        }
    }
}

/// Networks staked by default, in callback registration order.
pub const DEFAULT_STAKING_NETWORKS: &[&str] = &["polkadot", "kusama", "hydradx", "astar", "acala"];

lazy_static! {
    pub static ref NETWORKS: HashMap<&'static str, NetworkDescriptor> = {
        let mut m = HashMap::new();
        m.insert(
            "polkadot",
            NetworkDescriptor::new("polkadot", "Polkadot Relay Chain", "DOT", 10, AddressFamily::Account),
        );
        m.insert(
            "kusama",
            NetworkDescriptor::new("kusama", "Kusama Relay Chain", "KSM", 12, AddressFamily::Account),
        );
        m.insert(
            "hydradx",
            NetworkDescriptor::new("hydradx", "HydraDX", "HDX", 12, AddressFamily::Account),
        );
        m.insert(
            "astar",
            NetworkDescriptor::new("astar", "Astar", "ASTR", 18, AddressFamily::Account),
        );
        m.insert(
            "acala",
            NetworkDescriptor::new("acala", "Acala", "ACA", 12, AddressFamily::Account),
        );
        m.insert(
            "moonbeam",
            NetworkDescriptor::new("moonbeam", "Moonbeam", "GLMR", 18, AddressFamily::Contract),
        );
        m
    };
}

pub fn lookup(key: &str) -> Option<&'static NetworkDescriptor> {
    NETWORKS.get(key)
}


/// The caller-side default for `subscribe_staking`'s network list.
pub fn default_staking_networks() -> Vec<NetworkDescriptor> {
    DEFAULT_STAKING_NETWORKS
        .iter()
        .filter_map(|key| lookup(key).cloned())
        .collect()
}
