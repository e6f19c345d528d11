//! Per-host status stored in the snapshot

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitoring::MetricSample;

/// Short classification of why a host is failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// Connect or command exceeded the host timeout
    Timeout,
    /// Credentials were rejected
    #[serde(rename = "auth-error")]
    Auth,
    /// DNS failure, connection refused, no route
    Unreachable,
    /// Session dropped or ssh client failure
    #[serde(rename = "transport-error")]
    Transport,
    /// A metric command exited non-zero
    CommandFailed,
    /// Command output could not be parsed
    #[serde(rename = "parse-error")]
    Parse,
}

impl FailureReason {
    /// Returns the short label used in logs and the status column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Auth => "auth-error",
            Self::Unreachable => "unreachable",
            Self::Transport => "transport-error",
            Self::CommandFailed => "command-failed",
            Self::Parse => "parse-error",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a failed connect or poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Classification of the last failure
    pub reason: FailureReason,
    /// When the failing attempt finished
    pub last_attempt: DateTime<Utc>,
    /// Failed cycles since the last healthy one (at least 1)
    pub consecutive_failures: u32,
}

/// Current state of one host.
///
/// Exactly one of these exists per configured host for the life of the
/// snapshot store. Only the host's own worker replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HostStatus {
    /// No cycle has completed yet
    Connecting,
    /// Last cycle succeeded with this freshly captured sample
    Healthy(MetricSample),
    /// Last cycle failed
    Failed(FailureInfo),
}

impl HostStatus {
    /// Returns true for [`HostStatus::Healthy`]
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy(_))
    }

    /// Returns true for [`HostStatus::Failed`]
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the sample if healthy
    #[must_use]
    pub const fn sample(&self) -> Option<&MetricSample> {
        match self {
            Self::Healthy(sample) => Some(sample),
            _ => None,
        }
    }

    /// Returns the consecutive failure count (0 unless failed)
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        match self {
            Self::Failed(info) => info.consecutive_failures,
            _ => 0,
        }
    }
}
