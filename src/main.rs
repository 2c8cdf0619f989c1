use std::fs;

use alloy::providers::ProviderBuilder;
use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reward_audit::{
    DistributorClient, RangeScanner, RewardReconciler,
    config::AuditConfig,
    export::{self, TokenLabels},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).try_init();

    let config = AuditConfig::parse();
    config.validate()?;

    let provider = ProviderBuilder::new()
        .connect(config.rpc_url.as_str())
        .await
        .with_context(|| format!("failed to connect provider to {}", config.rpc_url))?;
    let client = DistributorClient::new(config.contract, provider);

    let events = RangeScanner::new()
        .scan(
            &client,
            config.start_block,
            config.pivot_block,
            config.events_per_block,
            &config.event_filter(),
        )
        .await?;
    info!(event_count = events.len(), "Fetched stake events");

    let result = RewardReconciler::new()
        .retry_policy(config.retry_policy())
        .failure_policy(config.failure_policy())
        .reconcile(&client, events, config.pivot_block, config.materiality_threshold)
        .await?;

    for failure in &result.failures {
        warn!(
            user = %failure.user,
            token = %failure.token,
            error = %failure.error,
            "Account skipped during reconciliation"
        );
    }

    let totals_file = fs::File::create(&config.output)
        .with_context(|| format!("failed to create {}", config.output.display()))?;
    export::write_totals(totals_file, &result)?;
    info!(path = %config.output.display(), users = result.totals.len(), "Wrote reward totals");

    if let Some(path) = &config.snapshots_output {
        let labels = load_token_labels(&config)?;
        let snapshots_file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        export::write_snapshots(snapshots_file, &result.snapshots, &labels)?;
        info!(path = %path.display(), accounts = result.snapshots.len(), "Wrote snapshot table");
    }

    Ok(())
}

fn load_token_labels(config: &AuditConfig) -> anyhow::Result<TokenLabels> {
    let Some(path) = &config.token_labels else {
        return Ok(TokenLabels::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read token labels from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("malformed token label table in {}", path.display()))
}
