//! Point-in-time reconciliation of staking reward state around a single
//! block's execution.
//!
//! Given a distributor contract and a pivot block, the audit answers: for
//! every (user, token) pair that ever staked, how much did the
//! contract-computed outstanding reward change as a direct result of that
//! block? It is run once per incident, not as a service.
//!
//! Two components run in sequence:
//!
//! * [`RangeScanner`] fetches the full stake-event history in provider-safe
//!   windows, sized from a per-chain span table ([`ProviderLimits`]) and a
//!   caller-supplied events-per-block estimate.
//! * [`RewardReconciler`] groups the events into (user, token) accounts,
//!   snapshots the reward view immediately before and after the pivot block,
//!   and aggregates the per-user deltas above a materiality threshold with
//!   exact 256-bit integer arithmetic.
//!
//! Everything external is reached through two seams, [`EventSource`] and
//! [`RewardLookup`]; [`DistributorClient`] implements both over an alloy
//! provider. Processing is strictly sequential by design: the external reads
//! are billed, rate-limited calls against a shared ledger client, and a
//! one-shot audit has no latency budget to spend on concurrency.

pub mod config;
pub mod contracts;
pub mod error;
pub mod event;
pub mod export;
pub mod filter;
pub mod limits;
pub mod range_scanner;
pub mod reconciler;
pub mod retry;
pub mod source;

pub use error::AuditError;
pub use event::{Account, RawEvent};
pub use filter::EventFilter;
pub use limits::ProviderLimits;
pub use range_scanner::{EventSource, RangeScanner};
pub use reconciler::{
    AccountFailure, AccountSnapshot, FailurePolicy, ReconciliationResult, RewardLookup,
    RewardReconciler,
};
pub use retry::RetryPolicy;
pub use source::DistributorClient;
