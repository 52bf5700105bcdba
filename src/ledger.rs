use serde::{Deserialize, Serialize};

/// One address's staking record for one subscription tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub stash: Option<String>,
    pub active: String,
    pub total: Option<String>,
    pub unlocking: Vec<UnlockChunk>,
    pub claimed_rewards: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockChunk {
    pub value: String,
    pub era: String,
}

// Human-readable staking ledger of account-based networks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountLedger {
    stash: Option<String>,
    active: Option<String>,
    total: Option<String>,
    #[serde(default)]
    unlocking: Vec<UnlockChunk>,
    #[serde(default)]
    claimed_rewards: Vec<String>,
}

// Delegator state of contract-style (EVM parachain) networks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DelegatorState {
    id: Option<String>,
    total: Option<String>,
    #[serde(default)]
    delegations: Vec<Delegation>,
}

#[derive(Debug, Deserialize)]
struct Delegation {
    owner: String,
}

impl LedgerSnapshot {
    pub(crate) fn from_account_ledger(raw: &serde_json::Value) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        let ledger: AccountLedger = serde_json::from_value(raw.clone()).ok()?;

        Some(Self {
            stash: ledger.stash,
            active: ledger.active.unwrap_or_default(),
            total: ledger.total,
            unlocking: ledger.unlocking,
            claimed_rewards: ledger.claimed_rewards,
        })
    }

    pub(crate) fn from_delegator_state(raw: &serde_json::Value) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        let state: DelegatorState = serde_json::from_value(raw.clone()).ok()?;

        Some(Self {
            stash: state.id,
            active: state.total.clone().unwrap_or_default(),
            total: state.total,
            unlocking: Vec::new(),
            claimed_rewards: state.delegations.into_iter().map(|d| d.owner).collect(),
        })
    }
}
