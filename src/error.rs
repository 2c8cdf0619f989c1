use alloy::{
    primitives::{Address, U256},
    transports::TransportError,
};
use thiserror::Error;

/// Errors produced while scanning events or reconciling reward state.
///
/// Configuration variants are fatal and surfaced before any network call is
/// made. Transport variants carry the underlying RPC failure; the scanner
/// propagates them immediately, while the reconciler retries the affected
/// account before surfacing [`AuditError::SnapshotFailed`].
#[derive(Error, Debug)]
pub enum AuditError {
    /// The requested block range is inverted.
    #[error("invalid block range: start block {start} exceeds end block {end}")]
    InvalidRange { start: u64, end: u64 },

    /// The pivot block leaves no room for a pre-pivot state read.
    #[error("pivot block must be greater than zero")]
    InvalidPivotBlock,

    /// The events-per-block estimate cannot be used to size query windows.
    #[error("events-per-block estimate must be finite and positive, got {0}")]
    InvalidDensityEstimate(f64),

    /// The density estimate is so large that no block window fits under the
    /// provider's per-query result cap.
    #[error(
        "window size underflow: estimate of {estimate} events/block leaves no room \
         under the {max_results}-result query cap"
    )]
    WindowSizeUnderflow { estimate: f64, max_results: u64 },

    /// The materiality threshold does not fit in a signed 256-bit integer.
    #[error("materiality threshold {0} exceeds the signed 256-bit range")]
    ThresholdOutOfRange(U256),

    /// The underlying RPC transport returned an error.
    #[error("RPC error: {0}")]
    Rpc(#[from] TransportError),

    /// Every lookup attempt failed for one account.
    #[error(
        "reward lookup failed for user {user}, token {token}, pivot block {pivot_block}: {source}"
    )]
    SnapshotFailed {
        user: Address,
        token: Address,
        pivot_block: u64,
        #[source]
        source: TransportError,
    },

    /// A single account's reward delta does not fit in a signed 256-bit
    /// integer.
    #[error("reward delta out of range for user {user}, token {token}")]
    DeltaOutOfRange { user: Address, token: Address },

    /// A user's aggregated delta overflowed signed 256-bit arithmetic.
    #[error("aggregated reward delta overflowed for user {0}")]
    AggregateOverflow(Address),
}
