use std::collections::BTreeMap;

use alloy::primitives::{Address, B256, U256};

/// One emitted distributor event, flattened for audit processing.
///
/// The chain position fields (`block_number`, `transaction_index`,
/// `log_index`) form a total order over events; see [`RawEvent::sort_key`].
/// The payload fields are opaque to the scanner and only meaningful to
/// downstream consumers of the per-account history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub transaction_index: u64,
    pub log_index: u64,
    pub user: Address,
    pub token: Address,
    pub amount: U256,
    pub cumulative_balance: U256,
    pub cumulative_staked: U256,
}

impl RawEvent {
    /// Chain-position key. Two events with equal keys denote the same log,
    /// so sorting by this key yields a deterministic account history.
    #[must_use]
    pub fn sort_key(&self) -> (u64, u64, u64) {
        (self.block_number, self.transaction_index, self.log_index)
    }

    /// The account this event belongs to.
    #[must_use]
    pub fn account(&self) -> Account {
        Account { user: self.user, token: self.token }
    }
}

/// The (user, token) identity events are grouped under and rewards are
/// computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Account {
    pub user: Address,
    pub token: Address,
}

/// Sorts events into chain-position order.
pub fn sort_events(events: &mut [RawEvent]) {
    events.sort_by_key(RawEvent::sort_key);
}

/// Partitions events into per-account groups.
///
/// Every event lands in exactly one group and the input order is preserved
/// within each group, so sorted input yields sorted account histories.
#[must_use]
pub fn group_by_account(events: Vec<RawEvent>) -> BTreeMap<Account, Vec<RawEvent>> {
    let mut groups: BTreeMap<Account, Vec<RawEvent>> = BTreeMap::new();
    for event in events {
        groups.entry(event.account()).or_default().push(event);
    }
    groups
}
