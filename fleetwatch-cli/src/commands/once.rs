//! One-shot poll command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fleetwatch_core::monitoring::MetricKind;
use fleetwatch_core::{
    Frame, HostConfig, MonitorSettings, PollOrchestrator, PollTiming, Snapshot, SshTransport,
};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::format_frame;
use crate::util::{build_hosts, load_config};

/// How long to wait for every host to leave the connecting state.
///
/// A first cycle is one connect plus one command per metric, each bounded
/// by the host timeout; the slowest host sets the limit, plus one poll
/// interval of slack.
#[must_use]
pub fn settle_limit(hosts: &[Arc<HostConfig>], settings: &MonitorSettings) -> Duration {
    let slowest = hosts.iter().map(|h| h.timeout).max().unwrap_or_default();
    let steps = 1 + MetricKind::ALL.len() as u32;
    slowest.saturating_mul(steps) + settings.poll_interval()
}

/// Maps the final snapshot to the command result.
///
/// Any host without a fresh sample counts as failed, including one still
/// connecting when the wait ran out.
pub fn check_hosts(snapshot: &Snapshot) -> Result<(), CliError> {
    let failed = snapshot.unhealthy_count();
    if failed > 0 {
        return Err(CliError::HostsFailed {
            failed,
            total: snapshot.len(),
        });
    }
    Ok(())
}

/// Once command handler
pub fn cmd_once(
    config_path: Option<&Path>,
    format: OutputFormat,
    color: bool,
) -> Result<(), CliError> {
    let (_, config) = load_config(config_path)?;
    let hosts = build_hosts(&config)?;
    let limit = settle_limit(&hosts, &config.monitor);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Runtime(format!("Failed to create async runtime: {e}")))?;

    let snapshot = runtime.block_on(async {
        let handle = PollOrchestrator::new(hosts, Arc::new(SshTransport::new()))
            .with_timing(PollTiming::from(&config.monitor))
            .start();
        let snapshot = handle.wait_until_settled(limit).await;
        if !snapshot.all_settled() {
            tracing::warn!(limit_secs = limit.as_secs(), "Some hosts did not answer in time");
        }
        let report = handle.shutdown().await;
        if !report.is_clean() {
            tracing::warn!(abandoned = ?report.abandoned, "Some workers did not stop in time");
        }
        snapshot
    });

    let frame = Frame::from(&snapshot);
    match format {
        OutputFormat::Table => print!("{}", format_frame(&frame, color)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&frame)
                .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))?
        ),
    }

    check_hosts(&snapshot)
}
