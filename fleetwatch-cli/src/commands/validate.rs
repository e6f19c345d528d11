//! Validate configuration command.

use std::path::Path;

use crate::error::CliError;
use crate::util::{build_hosts, load_config};

/// Validate command handler
pub fn cmd_validate(config_path: Option<&Path>) -> Result<(), CliError> {
    let (path, config) = load_config(config_path)?;
    let hosts = build_hosts(&config)?;

    println!(
        "{}: OK ({} host{}, poll every {}s, refresh every {}ms)",
        path.display(),
        hosts.len(),
        if hosts.len() == 1 { "" } else { "s" },
        config.monitor.poll_interval().as_secs(),
        config.monitor.display_interval().as_millis()
    );
    Ok(())
}
