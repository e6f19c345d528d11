//! Global polling settings
//!
//! Stored in the configuration file under `[monitor]` (or `"monitor"` in
//! JSON). Every field has a default so the section may be omitted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::backoff::BackoffConfig;
use crate::session::ssh::CONTROL_TIMEOUT;

/// Shortest accepted shutdown grace: a clean `ssh -O exit` must fit in it
const MIN_SHUTDOWN_GRACE_SECS: u32 = CONTROL_TIMEOUT.as_secs() as u32 + 1;

/// Global monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Delay between healthy poll cycles in seconds (1–300, default: 3)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u32,
    /// Table refresh period in milliseconds (100–60000, default: 1000)
    #[serde(default = "default_display_interval_ms")]
    pub display_interval_ms: u64,
    /// How long shutdown waits for workers in seconds (3–60, default: 5)
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u32,
    /// Delay policy after a failed cycle
    #[serde(default)]
    pub backoff: BackoffConfig,
}

const fn default_poll_interval_secs() -> u32 {
    3
}

const fn default_display_interval_ms() -> u64 {
    1000
}

const fn default_shutdown_grace_secs() -> u32 {
    5
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            display_interval_ms: default_display_interval_ms(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl MonitorSettings {
    /// Returns the poll interval clamped to the valid range (1–300 seconds)
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_secs.clamp(1, 300)))
    }

    /// Returns the display interval clamped to the valid range (100 ms–60 s)
    #[must_use]
    pub fn display_interval(&self) -> Duration {
        Duration::from_millis(self.display_interval_ms.clamp(100, 60_000))
    }

    /// Returns the shutdown grace clamped to the valid range (3–60 seconds)
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(u64::from(
            self.shutdown_grace_secs.clamp(MIN_SHUTDOWN_GRACE_SECS, 60),
        ))
    }
}

/// Per-worker timing derived from [`MonitorSettings`].
///
/// Tests build this directly to run cycles on millisecond scales that the
/// clamped file settings would not allow.
#[derive(Debug, Clone, PartialEq)]
pub struct PollTiming {
    /// Delay between healthy cycles
    pub poll_interval: Duration,
    /// Delay policy after a failed cycle
    pub backoff: BackoffConfig,
    /// How long shutdown waits for workers to exit
    pub shutdown_grace: Duration,
}

impl From<&MonitorSettings> for PollTiming {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            backoff: settings.backoff.clone(),
            shutdown_grace: settings.shutdown_grace(),
        }
    }
}

impl Default for PollTiming {
    fn default() -> Self {
        Self::from(&MonitorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = MonitorSettings::default();
        assert_eq!(s.poll_interval(), Duration::from_secs(3));
        assert_eq!(s.display_interval(), Duration::from_secs(1));
        assert_eq!(s.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    fn test_interval_clamping() {
        let s = MonitorSettings {
            poll_interval_secs: 0,
            display_interval_ms: 1,
            shutdown_grace_secs: 1000,
            ..Default::default()
        };
        assert_eq!(s.poll_interval(), Duration::from_secs(1));
        assert_eq!(s.display_interval(), Duration::from_millis(100));
        assert_eq!(s.shutdown_grace(), Duration::from_secs(60));
    }

    #[test]
    fn test_shutdown_grace_outlasts_session_close() {
        let s = MonitorSettings {
            shutdown_grace_secs: 1,
            ..Default::default()
        };
        assert!(s.shutdown_grace() > CONTROL_TIMEOUT);
        assert_eq!(s.shutdown_grace(), Duration::from_secs(3));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let s: MonitorSettings = serde_json::from_str(r#"{"poll_interval_secs": 10}"#).unwrap();
        assert_eq!(s.poll_interval_secs, 10);
        assert_eq!(s.display_interval_ms, 1000);
        assert_eq!(s.backoff, BackoffConfig::default());
    }

    #[test]
    fn test_timing_from_settings() {
        let timing = PollTiming::from(&MonitorSettings::default());
        assert_eq!(timing.poll_interval, Duration::from_secs(3));
        assert_eq!(timing.shutdown_grace, Duration::from_secs(5));
    }
}
