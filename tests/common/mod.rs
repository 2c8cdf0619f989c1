// not every test binary exercises every helper
#![allow(dead_code)]

use std::{collections::BTreeMap, ops::RangeInclusive, sync::Mutex};

use alloy::{
    primitives::{Address, B256, ChainId, U256},
    transports::{TransportError, TransportErrorKind},
};
use reward_audit::{EventFilter, EventSource, RawEvent, RewardLookup};

/// In-memory chain: scripted events, scripted reward reads, injectable
/// transport failures, and full call recording for assertions.
pub struct MockChain {
    chain_id: ChainId,
    events: Vec<RawEvent>,
    rewards: BTreeMap<(Address, Address, u64), U256>,
    /// Upcoming `query_logs` calls that fail before calls start succeeding.
    log_failures: Mutex<usize>,
    /// Upcoming `outstanding_rewards` calls that fail likewise.
    lookup_failures: Mutex<usize>,
    /// Every window queried, in call order.
    pub queried_windows: Mutex<Vec<RangeInclusive<u64>>>,
    /// Every reward read issued, in call order: (token, user, block).
    pub lookups: Mutex<Vec<(Address, Address, u64)>>,
}

impl MockChain {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            events: Vec::new(),
            rewards: BTreeMap::new(),
            log_failures: Mutex::new(0),
            lookup_failures: Mutex::new(0),
            queried_windows: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn with_events(mut self, events: Vec<RawEvent>) -> Self {
        self.events = events;
        self
    }

    /// Scripts the reward view for `(token, user)` at `block`.
    pub fn with_reward(mut self, token: Address, user: Address, block: u64, value: U256) -> Self {
        self.rewards.insert((token, user, block), value);
        self
    }

    pub fn fail_next_log_queries(self, count: usize) -> Self {
        *self.log_failures.lock().unwrap() = count;
        self
    }

    pub fn fail_next_lookups(self, count: usize) -> Self {
        *self.lookup_failures.lock().unwrap() = count;
        self
    }

    /// What a single unwindowed query over `range` would return.
    pub fn reference_query(&self, range: RangeInclusive<u64>, filter: &EventFilter) -> Vec<RawEvent> {
        self.events
            .iter()
            .filter(|event| range.contains(&event.block_number) && filter.matches(event))
            .cloned()
            .collect()
    }
}

impl EventSource for MockChain {
    async fn chain_id(&self) -> Result<ChainId, TransportError> {
        Ok(self.chain_id)
    }

    async fn query_logs(
        &self,
        range: RangeInclusive<u64>,
        filter: &EventFilter,
    ) -> Result<Vec<RawEvent>, TransportError> {
        self.queried_windows.lock().unwrap().push(range.clone());

        let mut failures = self.log_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(TransportErrorKind::custom_str("injected log query failure"));
        }
        drop(failures);

        Ok(self.reference_query(range, filter))
    }
}

impl RewardLookup for MockChain {
    async fn outstanding_rewards(
        &self,
        token: Address,
        user: Address,
        at_block: u64,
    ) -> Result<U256, TransportError> {
        self.lookups.lock().unwrap().push((token, user, at_block));

        let mut failures = self.lookup_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(TransportErrorKind::custom_str("injected lookup failure"));
        }
        drop(failures);

        Ok(self.rewards.get(&(token, user, at_block)).copied().unwrap_or(U256::ZERO))
    }
}

pub fn addr(byte: u8) -> Address {
    Address::with_last_byte(byte)
}

pub fn stake_event(
    block: u64,
    tx_index: u64,
    log_index: u64,
    user: Address,
    token: Address,
) -> RawEvent {
    RawEvent {
        transaction_hash: B256::from(U256::from(block) << 16 | U256::from(log_index)),
        block_number: block,
        transaction_index: tx_index,
        log_index,
        user,
        token,
        amount: U256::from(1_000u64),
        cumulative_balance: U256::from(1_000u64),
        cumulative_staked: U256::from(1_000u64),
    }
}
