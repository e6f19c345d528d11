//! Data model for one poll cycle's metrics
//!
//! All types are serializable so the CLI can emit snapshots as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// KiB per GiB, used to convert `free -k` and `df -Pk` output
pub const KIB_PER_GIB: f64 = 1_048_576.0;

/// Converts a KiB count into GiB
#[must_use]
pub fn kib_to_gib(kib: u64) -> f64 {
    kib as f64 / KIB_PER_GIB
}

/// Utilization captured by one complete poll cycle.
///
/// Every field comes from the same cycle; a sample is never assembled from
/// the outputs of different cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// CPU usage as a percentage (0.0–100.0)
    pub cpu_percent: f64,
    /// Used physical memory (GiB)
    pub mem_used_gb: f64,
    /// Total physical memory (GiB)
    pub mem_total_gb: f64,
    /// Used space on the root filesystem (GiB)
    pub disk_used: f64,
    /// Size of the root filesystem (GiB)
    pub disk_total: f64,
    /// When the cycle that produced this sample completed
    pub captured_at: DateTime<Utc>,
}

impl MetricSample {
    /// Returns memory usage as a percentage (0.0–100.0)
    #[must_use]
    pub fn mem_percent(&self) -> f64 {
        if self.mem_total_gb <= 0.0 {
            return 0.0;
        }
        (self.mem_used_gb / self.mem_total_gb) * 100.0
    }

    /// Returns disk usage as a percentage (0.0–100.0)
    #[must_use]
    pub fn disk_percent(&self) -> f64 {
        if self.disk_total <= 0.0 {
            return 0.0;
        }
        (self.disk_used / self.disk_total) * 100.0
    }
}
