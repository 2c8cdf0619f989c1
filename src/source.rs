use std::ops::RangeInclusive;

use alloy::{
    primitives::{Address, ChainId, U256},
    providers::Provider,
    rpc::types::{Filter, Log},
    sol_types::SolEvent,
    transports::{TransportError, TransportErrorKind},
};
use tracing::debug;

use crate::{
    contracts::AcceleratingDistributor::{self, AcceleratingDistributorInstance, Stake},
    event::RawEvent,
    filter::EventFilter,
    range_scanner::EventSource,
    reconciler::RewardLookup,
};

/// Alloy-backed client for one distributor deployment.
///
/// Implements both collaborator capabilities of the audit: [`EventSource`]
/// over `eth_getLogs` and [`RewardLookup`] over historical `eth_call`s
/// against the contract's reward view.
#[derive(Clone)]
pub struct DistributorClient<P: Provider> {
    contract: AcceleratingDistributorInstance<P>,
}

impl<P: Provider> DistributorClient<P> {
    #[must_use]
    pub fn new(address: Address, provider: P) -> Self {
        Self { contract: AcceleratingDistributor::new(address, provider) }
    }

    /// Distributor address this client is bound to.
    #[must_use]
    pub fn address(&self) -> Address {
        *self.contract.address()
    }

    fn log_filter(&self, range: &RangeInclusive<u64>, filter: &EventFilter) -> Filter {
        let mut log_filter = Filter::new()
            .address(self.address())
            .event_signature(Stake::SIGNATURE_HASH)
            .from_block(*range.start())
            .to_block(*range.end());

        // token and user are the event's first and second indexed parameters
        if let Some(token) = filter.token_constraint() {
            log_filter = log_filter.topic1(token.into_word());
        }
        if let Some(user) = filter.user_constraint() {
            log_filter = log_filter.topic2(user.into_word());
        }

        log_filter
    }
}

fn decode_stake(log: &Log) -> Result<RawEvent, TransportError> {
    let decoded = log
        .log_decode::<Stake>()
        .map_err(|err| TransportErrorKind::custom_str(&format!("undecodable stake log: {err}")))?;
    let stake = decoded.inner.data;

    // inclusion metadata is only absent on pending logs, which a scan over
    // mined ranges never yields
    let missing =
        |field: &str| TransportErrorKind::custom_str(&format!("stake log missing {field}"));

    Ok(RawEvent {
        transaction_hash: log.transaction_hash.ok_or_else(|| missing("transaction hash"))?,
        block_number: log.block_number.ok_or_else(|| missing("block number"))?,
        transaction_index: log.transaction_index.ok_or_else(|| missing("transaction index"))?,
        log_index: log.log_index.ok_or_else(|| missing("log index"))?,
        user: stake.user,
        token: stake.token,
        amount: stake.amount,
        cumulative_balance: stake.cumulativeBalance,
        cumulative_staked: stake.tokenCumulativeStaked,
    })
}

impl<P: Provider> EventSource for DistributorClient<P> {
    async fn chain_id(&self) -> Result<ChainId, TransportError> {
        self.contract.provider().get_chain_id().await
    }

    async fn query_logs(
        &self,
        range: RangeInclusive<u64>,
        filter: &EventFilter,
    ) -> Result<Vec<RawEvent>, TransportError> {
        let log_filter = self.log_filter(&range, filter);
        let logs = self.contract.provider().get_logs(&log_filter).await?;

        debug!(
            window_start = *range.start(),
            window_end = *range.end(),
            count = logs.len(),
            "eth_getLogs window"
        );

        logs.iter().map(decode_stake).collect()
    }
}

impl<P: Provider> RewardLookup for DistributorClient<P> {
    async fn outstanding_rewards(
        &self,
        token: Address,
        user: Address,
        at_block: u64,
    ) -> Result<U256, TransportError> {
        self.contract
            .getOutstandingRewards(token, user)
            .block(at_block.into())
            .call()
            .await
            .map_err(|err| match err {
                alloy::contract::Error::TransportError(transport) => transport,
                other => TransportErrorKind::custom_str(&other.to_string()),
            })
    }
}
