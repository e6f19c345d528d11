//! Shared utility functions used across command modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fleetwatch_core::config::{default_log_path, resolve_config_path};
use fleetwatch_core::{FleetConfig, HostConfig, TracingConfig, TracingLevel, TracingOutput};

use crate::error::CliError;

/// Resolves and loads the configuration file
pub fn load_config(config_path: Option<&Path>) -> Result<(PathBuf, FleetConfig), CliError> {
    let path = resolve_config_path(config_path).ok_or_else(|| {
        CliError::Config("no configuration file found; pass --config".to_string())
    })?;
    let config = FleetConfig::load(&path)?;
    Ok((path, config))
}

/// Validates `config` and builds shared host handles in configuration order
pub fn build_hosts(config: &FleetConfig) -> Result<Vec<Arc<HostConfig>>, CliError> {
    Ok(config.hosts()?.into_iter().map(Arc::new).collect())
}

/// Builds the tracing configuration for this invocation.
///
/// Commands that own the terminal log to a file; the rest log to stderr
/// unless `--log-file` is given. Non-empty filter directives replace the
/// level picked from `-v`/`-q`.
#[must_use]
pub fn tracing_config(
    verbose: u8,
    quiet: bool,
    color: bool,
    log_file: Option<&Path>,
    log_filter: Option<&str>,
    owns_terminal: bool,
) -> TracingConfig {
    let output = match log_file {
        Some(path) => TracingOutput::File {
            path: path.to_path_buf(),
        },
        None if owns_terminal => default_log_path()
            .map_or(TracingOutput::Stderr, |path| TracingOutput::File { path }),
        None => TracingOutput::Stderr,
    };

    let config = TracingConfig::new()
        .with_level(TracingLevel::from_verbosity(verbose, quiet))
        .with_output(output)
        .with_ansi(color);
    match log_filter.map(str::trim) {
        Some(filter) if !filter.is_empty() => config.with_filter(filter),
        _ => config,
    }
}
