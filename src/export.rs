use std::{collections::BTreeMap, io::Write};

use alloy::primitives::Address;
use serde::Serialize;

use crate::reconciler::{AccountSnapshot, ReconciliationResult};

/// Token address → human-readable label, used to annotate the snapshot
/// export. Tokens without a label are exported with an empty label column.
pub type TokenLabels = BTreeMap<Address, String>;

#[derive(Debug, Serialize)]
struct TotalRow {
    user: String,
    delta: String,
}

#[derive(Debug, Serialize)]
struct SnapshotRow {
    user: String,
    token: String,
    label: String,
    pre_rewards: String,
    post_rewards: String,
    delta: String,
}

/// Writes the filtered user totals: one row per material user, the
/// aggregated delta rendered as a decimal string so no precision is lost in
/// text form.
///
/// # Errors
///
/// Returns an error if a row cannot be serialized or the writer fails.
pub fn write_totals<W: Write>(writer: W, result: &ReconciliationResult) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for (user, delta) in &result.totals {
        csv_writer.serialize(TotalRow { user: user.to_string(), delta: delta.to_string() })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes the full audit table: every snapshotted account with its pre/post
/// reward state and delta, labeled where the label table knows the token.
///
/// # Errors
///
/// Returns an error if a row cannot be serialized or the writer fails.
pub fn write_snapshots<W: Write>(
    writer: W,
    snapshots: &[AccountSnapshot],
    labels: &TokenLabels,
) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for snapshot in snapshots {
        csv_writer.serialize(SnapshotRow {
            user: snapshot.user.to_string(),
            token: snapshot.token.to_string(),
            label: labels.get(&snapshot.token).cloned().unwrap_or_default(),
            pre_rewards: snapshot.pre.to_string(),
            post_rewards: snapshot.post.to_string(),
            delta: snapshot.delta.to_string(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
