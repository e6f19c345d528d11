//! Live table command.

use std::path::Path;
use std::sync::Arc;

use fleetwatch_core::{DisplayLoop, MonitorSettings, PollOrchestrator, PollTiming, SshTransport};

use crate::error::CliError;
use crate::render::TerminalRenderer;
use crate::util::{build_hosts, load_config};

/// Command-line overrides for the configured timing
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOverrides {
    pub poll_interval_secs: Option<u32>,
    pub display_interval_ms: Option<u64>,
}

impl WatchOverrides {
    /// Applies the overrides on top of the file settings
    #[must_use]
    pub fn apply(self, settings: &MonitorSettings) -> MonitorSettings {
        let mut settings = settings.clone();
        if let Some(secs) = self.poll_interval_secs {
            settings.poll_interval_secs = secs;
        }
        if let Some(ms) = self.display_interval_ms {
            settings.display_interval_ms = ms;
        }
        settings
    }
}

/// Watch command handler
pub fn cmd_watch(
    config_path: Option<&Path>,
    overrides: WatchOverrides,
    color: bool,
) -> Result<(), CliError> {
    let (path, config) = load_config(config_path)?;
    let hosts = build_hosts(&config)?;
    let settings = overrides.apply(&config.monitor);

    tracing::info!(
        config = %path.display(),
        hosts = hosts.len(),
        poll_secs = settings.poll_interval().as_secs(),
        "Starting watch"
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Runtime(format!("Failed to create async runtime: {e}")))?;

    let report = runtime.block_on(async {
        let handle = PollOrchestrator::new(hosts, Arc::new(SshTransport::new()))
            .with_timing(PollTiming::from(&settings))
            .start();
        let display = DisplayLoop::new(
            handle.store(),
            TerminalRenderer::new(color),
            settings.display_interval(),
        );
        display.run(handle, interrupted()).await
    });

    println!("\nMonitoring stopped by user");
    if !report.abandoned.is_empty() {
        eprintln!(
            "Warning: {} host(s) did not disconnect in time: {}",
            report.abandoned.len(),
            report.abandoned.join(", ")
        );
    }
    Ok(())
}

/// Completes on Ctrl-C
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Cannot listen for Ctrl-C; stop with SIGTERM");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let base = MonitorSettings::default();
        let settings = WatchOverrides {
            poll_interval_secs: Some(10),
            display_interval_ms: None,
        }
        .apply(&base);
        assert_eq!(settings.poll_interval(), Duration::from_secs(10));
        assert_eq!(settings.display_interval(), base.display_interval());
    }

    #[test]
    fn test_overrides_are_clamped() {
        let settings = WatchOverrides {
            poll_interval_secs: Some(0),
            display_interval_ms: Some(5),
        }
        .apply(&MonitorSettings::default());
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.display_interval(), Duration::from_millis(100));
    }
}
