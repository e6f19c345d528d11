//! Delay policy applied after a failed connect or poll cycle
//!
//! The default waits one host timeout before reconnecting, capped at
//! `max_delay_ms`. Exponential growth is available as an opt-in mode:
//! `min(timeout * multiplier^(failures - 1), max_delay)`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cap on any backoff delay in milliseconds
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Default multiplier for exponential mode
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Floor on any backoff delay in milliseconds
pub const MIN_DELAY_MS: u64 = 100;

/// How the delay grows across consecutive failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    /// Always wait one host timeout
    #[default]
    Fixed,
    /// Multiply the delay on each consecutive failure
    Exponential,
}

/// Configuration for post-failure delays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Growth mode
    #[serde(default)]
    pub mode: BackoffMode,
    /// Multiplier for exponential mode
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Upper bound on any delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

const fn default_multiplier() -> f64 {
    DEFAULT_BACKOFF_MULTIPLIER
}

const fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            mode: BackoffMode::Fixed,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl BackoffConfig {
    /// Creates a fixed backoff configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an exponential backoff configuration
    #[must_use]
    pub fn exponential() -> Self {
        Self {
            mode: BackoffMode::Exponential,
            ..Self::default()
        }
    }

    /// Sets the multiplier
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the maximum delay
    #[must_use]
    pub const fn with_max_delay_ms(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    /// Calculates the delay after `failures` consecutive failures (1-based).
    ///
    /// `base` is the host's configured timeout.
    #[must_use]
    pub fn delay(&self, base: Duration, failures: u32) -> Duration {
        let base_ms = base.as_millis().min(u128::from(u64::MAX)) as u64;
        let delay_ms = match self.mode {
            BackoffMode::Fixed => base_ms,
            BackoffMode::Exponential => {
                let exponent = failures.saturating_sub(1).min(63) as i32;
                let grown = base_ms as f64 * self.multiplier.max(1.0).powi(exponent);
                if grown.is_finite() && grown < u64::MAX as f64 {
                    grown as u64
                } else {
                    u64::MAX
                }
            }
        };
        let cap = self.max_delay_ms.max(MIN_DELAY_MS);
        Duration::from_millis(delay_ms.clamp(MIN_DELAY_MS, cap))
    }
}
