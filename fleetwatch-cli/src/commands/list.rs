//! List configured hosts command.

use std::path::Path;
use std::sync::Arc;

use fleetwatch_core::HostConfig;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::format_hosts_table;
use crate::util::{build_hosts, load_config};

/// List hosts command handler
pub fn cmd_list(config_path: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let (_, config) = load_config(config_path)?;
    let hosts = build_hosts(&config)?;

    match format {
        OutputFormat::Table => println!("{}", format_hosts_table(&hosts)),
        OutputFormat::Json => println!("{}", format_json(&hosts)?),
    }

    Ok(())
}

/// Format hosts as a JSON array
///
/// # Errors
///
/// Returns `CliError::Output` if JSON serialization fails.
pub fn format_json(hosts: &[Arc<HostConfig>]) -> Result<String, CliError> {
    let output: Vec<HostOutput<'_>> = hosts.iter().map(|h| HostOutput::from(h.as_ref())).collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))
}

/// Host fields safe to print; credentials are reduced to the method
#[derive(Debug, Serialize)]
pub struct HostOutput<'a> {
    pub name: &'a str,
    pub hostname: &'a str,
    pub port: u16,
    pub username: &'a str,
    pub auth_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    pub timeout_secs: u64,
}

impl<'a> From<&'a HostConfig> for HostOutput<'a> {
    fn from(host: &'a HostConfig) -> Self {
        Self {
            name: &host.name,
            hostname: &host.hostname,
            port: host.port,
            username: &host.credentials.username,
            auth_method: host.credentials.auth_method(),
            key_file: host
                .credentials
                .key_file
                .as_ref()
                .map(|p| p.display().to_string()),
            timeout_secs: host.timeout.as_secs(),
        }
    }
}
