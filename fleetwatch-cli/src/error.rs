//! CLI error types and exit codes.

use fleetwatch_core::ConfigError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or other non-host errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Host failure - at least one host could not be polled
    pub const HOST_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Async runtime could not be started
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Output could not be produced
    #[error("Output error: {0}")]
    Output(String),

    /// One or more hosts ended in a failed state
    #[error("{failed} of {total} hosts failed")]
    HostsFailed {
        /// Hosts in the failed state
        failed: usize,
        /// Hosts polled
        total: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, runtime, output, IO)
    /// - 2: Host failure (a polled host ended failed)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::HostsFailed { .. } => exit_codes::HOST_FAILURE,
            Self::Config(_) | Self::Runtime(_) | Self::Output(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
