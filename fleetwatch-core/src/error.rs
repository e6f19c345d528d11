//! Error types for fleetwatch
//!
//! Host-local errors ([`ConnectError`], [`CommandError`], [`ParseError`]) never
//! escape a worker: they are classified into a [`FailureReason`], written to the
//! host's slot and logged. Only [`ConfigError`] and [`StoreError`] reach callers
//! of the public API.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::FailureReason;

/// Errors raised while establishing a remote session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The connection attempt did not finish within the host timeout
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// The remote host rejected the credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Name resolution failed, connection refused, or no route to host
    #[error("host unreachable: {0}")]
    Unreachable(String),

    /// Any other transport failure (client missing, protocol error)
    #[error("transport error: {0}")]
    Transport(String),
}

impl ConnectError {
    /// Short classification shown in the status column
    #[must_use]
    pub const fn reason(&self) -> FailureReason {
        match self {
            Self::Timeout(_) => FailureReason::Timeout,
            Self::Auth(_) => FailureReason::Auth,
            Self::Unreachable(_) => FailureReason::Unreachable,
            Self::Transport(_) => FailureReason::Transport,
        }
    }
}

/// Errors raised while running a command on a live session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command did not finish within the host timeout
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The command ran but exited with a non-zero status
    #[error("command exited with status {code}")]
    NonZeroExit {
        /// Exit status reported by the remote shell
        code: i32,
    },

    /// The session dropped while the command was in flight
    #[error("transport error: {0}")]
    Transport(String),
}

impl CommandError {
    /// Short classification shown in the status column
    #[must_use]
    pub const fn reason(&self) -> FailureReason {
        match self {
            Self::Timeout(_) => FailureReason::Timeout,
            Self::NonZeroExit { .. } => FailureReason::CommandFailed,
            Self::Transport(_) => FailureReason::Transport,
        }
    }
}

/// Errors raised by the metric parser
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// An expected field was absent from the command output
    #[error("missing {0}")]
    Missing(&'static str),

    /// A field was present but not a number
    #[error("{field} is not numeric: {value:?}")]
    NotNumeric {
        /// Which field failed
        field: &'static str,
        /// The offending token
        value: String,
    },

    /// A value was numeric but outside its valid range
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Which field failed
        field: &'static str,
        /// The offending value
        value: f64,
    },

    /// Used exceeds total, or total is zero
    #[error("{what} used ({used}) exceeds total ({total})")]
    Inverted {
        /// `memory` or `disk`
        what: &'static str,
        /// Reported used amount (KiB)
        used: u64,
        /// Reported total amount (KiB)
        total: u64,
    },
}

impl ParseError {
    /// Short classification shown in the status column
    #[must_use]
    pub const fn reason(&self) -> FailureReason {
        FailureReason::Parse
    }
}

/// Errors raised while loading or validating the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not map to a supported format
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The file contents could not be deserialized
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Deserializer message
        message: String,
    },

    /// The configuration parsed but violates a constraint
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Errors raised by the snapshot store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The host name was not part of the configuration
    #[error("unknown host: {0}")]
    UnknownHost(String),
}

/// Top-level error type for the public API
#[derive(Debug, Error)]
pub enum FleetError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Snapshot store error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Connect error surfaced outside a worker (e.g. one-shot checks)
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Command error surfaced outside a worker
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Parse error surfaced outside a worker
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fleetwatch operations
pub type FleetResult<T> = Result<T, FleetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_reasons() {
        assert_eq!(
            ConnectError::Timeout(Duration::from_secs(1)).reason(),
            FailureReason::Timeout
        );
        assert_eq!(
            ConnectError::Auth("denied".into()).reason(),
            FailureReason::Auth
        );
        assert_eq!(
            ConnectError::Unreachable("refused".into()).reason(),
            FailureReason::Unreachable
        );
    }

    #[test]
    fn test_command_error_reasons() {
        assert_eq!(
            CommandError::NonZeroExit { code: 1 }.reason(),
            FailureReason::CommandFailed
        );
        assert_eq!(
            CommandError::Transport("reset".into()).reason(),
            FailureReason::Transport
        );
    }

    #[test]
    fn test_fleet_error_from_store() {
        let err: FleetError = StoreError::UnknownHost("db1".into()).into();
        assert_eq!(err.to_string(), "unknown host: db1");
    }
}
