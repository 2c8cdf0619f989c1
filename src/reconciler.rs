use std::collections::BTreeMap;

use alloy::{
    primitives::{Address, I256, U256},
    transports::TransportError,
};
use tracing::{info, warn};

use crate::{
    error::AuditError,
    event::{Account, RawEvent, group_by_account, sort_events},
    retry::RetryPolicy,
};

/// Historical point read of contract-computed reward state.
#[allow(async_fn_in_trait)]
pub trait RewardLookup {
    /// Outstanding rewards for `(token, user)` as the contract computed them
    /// at `at_block`.
    async fn outstanding_rewards(
        &self,
        token: Address,
        user: Address,
        at_block: u64,
    ) -> Result<U256, TransportError>;
}

/// What to do when one account's snapshot still fails after retries.
///
/// The reconciler only signals per-account failures; whether one aborts the
/// run is the driver's call, made through this parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole reconciliation on the first failed account.
    #[default]
    Abort,
    /// Record the failure and continue with the remaining accounts.
    Skip,
}

/// Point-in-time reward quantities for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub user: Address,
    pub token: Address,
    /// Reward state at pivot − 1.
    pub pre: U256,
    /// Reward state at pivot + 1.
    pub post: U256,
    /// `pre − post`; negative when rewards increased across the pivot.
    pub delta: I256,
}

/// An account excluded under [`FailurePolicy::Skip`], kept for the audit
/// trail.
#[derive(Debug)]
pub struct AccountFailure {
    pub user: Address,
    pub token: Address,
    pub error: AuditError,
}

/// Outcome of one reconciliation run. Built once, exported once.
#[derive(Debug, Default)]
pub struct ReconciliationResult {
    /// User → aggregated delta across the user's tokens, filtered to entries
    /// strictly above the materiality threshold.
    pub totals: BTreeMap<Address, I256>,
    /// Every successfully snapshotted account, including those whose user
    /// fell below the threshold, so excluded entries remain auditable.
    pub snapshots: Vec<AccountSnapshot>,
    /// Accounts skipped under [`FailurePolicy::Skip`].
    pub failures: Vec<AccountFailure>,
}

/// Groups scanned events into accounts and reconciles each account's reward
/// state across the pivot block.
///
/// Accounts are processed sequentially on purpose: the lookups are billed,
/// rate-limited reads against a shared ledger client and the run has no
/// latency budget. Account snapshots share no state, so a bounded worker
/// pool would be an additive change if that trade-off ever flips.
#[derive(Debug, Clone, Default)]
pub struct RewardReconciler {
    retry: RetryPolicy,
    failure_policy: FailurePolicy,
}

impl RewardReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the per-account lookup retry policy.
    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the reaction to a failed account snapshot.
    #[must_use]
    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Reconciles `events` against reward state on both sides of
    /// `pivot_block`.
    ///
    /// State is read at `pivot_block − 1` and `pivot_block + 1`, never at the
    /// pivot itself: the pivot transaction's net effect is only observable
    /// strictly before versus strictly after, since mid-execution state is
    /// not queryable.
    ///
    /// # Errors
    ///
    /// * [`AuditError::InvalidPivotBlock`] - `pivot_block` is 0.
    /// * [`AuditError::ThresholdOutOfRange`] - threshold above `I256::MAX`.
    /// * [`AuditError::SnapshotFailed`] - an account's lookups kept failing
    ///   and the policy is [`FailurePolicy::Abort`].
    /// * [`AuditError::DeltaOutOfRange`] / [`AuditError::AggregateOverflow`]
    ///   - a value escaped the signed 256-bit range.
    pub async fn reconcile<L: RewardLookup>(
        &self,
        lookup: &L,
        mut events: Vec<RawEvent>,
        pivot_block: u64,
        materiality_threshold: U256,
    ) -> Result<ReconciliationResult, AuditError> {
        if pivot_block == 0 {
            return Err(AuditError::InvalidPivotBlock);
        }
        let threshold = I256::try_from(materiality_threshold)
            .map_err(|_| AuditError::ThresholdOutOfRange(materiality_threshold))?;

        sort_events(&mut events);
        let accounts = group_by_account(events);

        info!(account_count = accounts.len(), pivot_block, "Reconciling accounts");

        let mut result = ReconciliationResult::default();
        let mut totals: BTreeMap<Address, I256> = BTreeMap::new();

        for &account in accounts.keys() {
            let snapshot = match self.snapshot_account(lookup, account, pivot_block).await {
                Ok(snapshot) => snapshot,
                Err(error) => match self.failure_policy {
                    FailurePolicy::Abort => return Err(error),
                    FailurePolicy::Skip => {
                        warn!(
                            user = %account.user,
                            token = %account.token,
                            error = %error,
                            "Skipping account after failed snapshot"
                        );
                        result.failures.push(AccountFailure {
                            user: account.user,
                            token: account.token,
                            error,
                        });
                        continue;
                    }
                },
            };

            let total = totals.entry(account.user).or_insert(I256::ZERO);
            *total = total
                .checked_add(snapshot.delta)
                .ok_or(AuditError::AggregateOverflow(account.user))?;
            result.snapshots.push(snapshot);
        }

        result.totals = totals.into_iter().filter(|(_, delta)| *delta > threshold).collect();

        info!(
            material_users = result.totals.len(),
            snapshot_count = result.snapshots.len(),
            skipped = result.failures.len(),
            "Reconciliation complete"
        );
        Ok(result)
    }

    /// Reads the pre/post pair for one account. The pair is the unit of
    /// retry: a failure on either read restarts both.
    async fn snapshot_account<L: RewardLookup>(
        &self,
        lookup: &L,
        account: Account,
        pivot_block: u64,
    ) -> Result<AccountSnapshot, AuditError> {
        let Account { user, token } = account;

        let (pre, post) = self
            .retry
            .run(|| async move {
                let pre = lookup.outstanding_rewards(token, user, pivot_block - 1).await?;
                let post = lookup.outstanding_rewards(token, user, pivot_block + 1).await?;
                Ok::<_, TransportError>((pre, post))
            })
            .await
            .map_err(|source| AuditError::SnapshotFailed { user, token, pivot_block, source })?;

        let delta = signed_delta(pre, post).ok_or(AuditError::DeltaOutOfRange { user, token })?;

        Ok(AccountSnapshot { user, token, pre, post, delta })
    }
}

/// `pre − post` as an exact signed 256-bit value, or `None` when the
/// magnitude exceeds `I256::MAX`.
fn signed_delta(pre: U256, post: U256) -> Option<I256> {
    if pre >= post {
        I256::try_from(pre - post).ok()
    } else {
        I256::try_from(post - pre).ok().map(|delta| -delta)
    }
}
