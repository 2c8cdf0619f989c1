use std::{path::PathBuf, time::Duration};

use alloy::primitives::{Address, U256};
use clap::Parser;

use crate::{
    error::AuditError,
    filter::EventFilter,
    reconciler::FailurePolicy,
    retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy},
};

/// Reconciles a staking distributor's reward state around a single block's
/// execution and exports the per-user deltas that exceed a materiality
/// threshold.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct AuditConfig {
    /// Distributor contract address.
    #[arg(long)]
    pub contract: Address,

    /// JSON-RPC endpoint of an archive node.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,

    /// First block the contract could have emitted stake events.
    #[arg(long)]
    pub start_block: u64,

    /// Block whose execution effects are being measured. The scan covers
    /// [start-block, pivot-block]; reward state is read at pivot ± 1.
    #[arg(long)]
    pub pivot_block: u64,

    /// Minimum aggregated delta (in the token's smallest unit, decimal) for
    /// a user to appear in the totals export.
    #[arg(long, default_value = "100000000000000000000")]
    pub materiality_threshold: U256,

    /// A-priori events-per-block density estimate used to size log query
    /// windows. Overestimating shrinks windows; underestimating risks
    /// truncated provider responses.
    #[arg(long, default_value_t = 0.1)]
    pub events_per_block: f64,

    /// Restrict the scan to one user address.
    #[arg(long)]
    pub user: Option<Address>,

    /// Restrict the scan to one staking token address.
    #[arg(long)]
    pub token: Option<Address>,

    /// Reward lookup attempts per account before its snapshot is declared
    /// failed.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub lookup_attempts: usize,

    /// Delay in seconds between lookup attempts for the same account.
    #[arg(long, default_value_t = 1)]
    pub lookup_backoff_secs: u64,

    /// Record failed accounts and keep going instead of aborting the run.
    #[arg(long)]
    pub skip_failed_accounts: bool,

    /// Where to write the filtered user totals.
    #[arg(long, default_value = "reward_delta.csv")]
    pub output: PathBuf,

    /// Where to write the full per-account snapshot table, if anywhere.
    #[arg(long)]
    pub snapshots_output: Option<PathBuf>,

    /// JSON file mapping token addresses to labels for the snapshot export.
    #[arg(long)]
    pub token_labels: Option<PathBuf>,
}

impl AuditConfig {
    /// Driver-level sanity checks: the scan must end at the pivot and a
    /// pre-pivot read must exist.
    ///
    /// # Errors
    ///
    /// * [`AuditError::InvalidPivotBlock`] - `pivot_block` is 0.
    /// * [`AuditError::InvalidRange`] - `start_block` is past the pivot.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.pivot_block == 0 {
            return Err(AuditError::InvalidPivotBlock);
        }
        if self.start_block > self.pivot_block {
            return Err(AuditError::InvalidRange { start: self.start_block, end: self.pivot_block });
        }
        Ok(())
    }

    #[must_use]
    pub fn event_filter(&self) -> EventFilter {
        let mut filter = EventFilter::new();
        if let Some(user) = self.user {
            filter = filter.user(user);
        }
        if let Some(token) = self.token {
            filter = filter.token(token);
        }
        filter
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.lookup_attempts, Duration::from_secs(self.lookup_backoff_secs))
    }

    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.skip_failed_accounts { FailurePolicy::Skip } else { FailurePolicy::Abort }
    }
}
