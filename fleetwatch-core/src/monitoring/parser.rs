//! Parser for remote host metrics output
//!
//! Each poll cycle runs three commands ([`CPU_COMMAND`], [`MEMORY_COMMAND`],
//! [`DISK_COMMAND`]) and hands their stdout to [`MetricsParser::parse`].
//! Parsing is all-or-nothing: a single bad field rejects the whole sample.

use chrono::{DateTime, Utc};

use super::metrics::{MetricSample, kib_to_gib};
use crate::error::ParseError;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Prints the user CPU percentage from `top`'s summary line
pub const CPU_COMMAND: &str = "top -bn1 | grep 'Cpu(s)' | awk '{print $2}'";

/// Prints `total used free` in KiB
pub const MEMORY_COMMAND: &str = "free -k | grep Mem | awk '{print $2,$3,$4}'";

/// Prints the POSIX `df` line for the root filesystem in KiB
pub const DISK_COMMAND: &str = "df -Pk / | tail -1";

/// The three metric-gathering commands, in the order a cycle runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// CPU utilization
    Cpu,
    /// Physical memory
    Memory,
    /// Root filesystem
    Disk,
}

impl MetricKind {
    /// All kinds in execution order
    pub const ALL: [Self; 3] = [Self::Cpu, Self::Memory, Self::Disk];

    /// Shell command for this metric
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Cpu => CPU_COMMAND,
            Self::Memory => MEMORY_COMMAND,
            Self::Disk => DISK_COMMAND,
        }
    }

    /// Label used in log fields
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Disk => "disk",
        }
    }
}

/// Raw stdout of one cycle's three commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetrics {
    /// Output of [`CPU_COMMAND`]
    pub cpu: String,
    /// Output of [`MEMORY_COMMAND`]
    pub memory: String,
    /// Output of [`DISK_COMMAND`]
    pub disk: String,
}

impl RawMetrics {
    /// Stores `output` in the slot for `kind`
    pub fn set(&mut self, kind: MetricKind, output: String) {
        match kind {
            MetricKind::Cpu => self.cpu = output,
            MetricKind::Memory => self.memory = output,
            MetricKind::Disk => self.disk = output,
        }
    }
}

/// Used/total pair in KiB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    /// Used KiB
    pub used_kib: u64,
    /// Total KiB
    pub total_kib: u64,
}

/// Stateless parser for remote metrics output
pub struct MetricsParser;

impl MetricsParser {
    /// Parses one cycle's raw output into a [`MetricSample`].
    ///
    /// `captured_at` is stamped onto the sample unchanged so the parser stays
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if any field is missing, non-numeric, out of
    /// range, or if used exceeds total for memory or disk.
    pub fn parse(raw: &RawMetrics, captured_at: DateTime<Utc>) -> ParseResult<MetricSample> {
        let cpu_percent = Self::parse_cpu(&raw.cpu)?;
        let memory = Self::parse_memory(&raw.memory)?;
        let disk = Self::parse_disk(&raw.disk)?;

        Ok(MetricSample {
            cpu_percent,
            mem_used_gb: kib_to_gib(memory.used_kib),
            mem_total_gb: kib_to_gib(memory.total_kib),
            disk_used: kib_to_gib(disk.used_kib),
            disk_total: kib_to_gib(disk.total_kib),
            captured_at,
        })
    }

    /// Parses the CPU percentage.
    ///
    /// Format: `25.3` (a trailing `%` and a decimal comma are accepted)
    ///
    /// # Errors
    ///
    /// Fails on empty output, a non-numeric value, or a value outside 0–100.
    pub fn parse_cpu(output: &str) -> ParseResult<f64> {
        let line = output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or(ParseError::Missing("cpu percentage"))?;

        let token = line
            .split_whitespace()
            .next()
            .ok_or(ParseError::Missing("cpu percentage"))?;
        let normalized = token.trim_end_matches('%').replace(',', ".");

        let value: f64 = normalized.parse().map_err(|_| ParseError::NotNumeric {
            field: "cpu",
            value: token.to_string(),
        })?;

        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ParseError::OutOfRange {
                field: "cpu",
                value,
            });
        }
        Ok(value)
    }

    /// Parses memory usage.
    ///
    /// Format: `total used free` in KiB, optionally prefixed by `Mem:`
    ///
    /// # Errors
    ///
    /// Fails when fewer than two numbers are present, on non-numeric fields,
    /// or when used exceeds total.
    pub fn parse_memory(output: &str) -> ParseResult<Usage> {
        let line = output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or(ParseError::Missing("memory line"))?;

        let fields: Vec<&str> = line
            .split_whitespace()
            .filter(|f| *f != "Mem:")
            .collect();
        if fields.len() < 2 {
            return Err(ParseError::Missing("memory used/total"));
        }

        let total_kib = Self::parse_kib("memory total", fields[0])?;
        let used_kib = Self::parse_kib("memory used", fields[1])?;
        Self::check_usage("memory", used_kib, total_kib)
    }

    /// Parses root filesystem usage from `df -Pk`.
    ///
    /// Format: `Filesystem  1024-blocks  Used  Available  Capacity  Mounted`
    ///
    /// The header line is skipped; the line mounted at `/` wins, otherwise
    /// the first data line is used.
    ///
    /// # Errors
    ///
    /// Fails when no data line exists, on non-numeric size fields, or when
    /// used exceeds total.
    pub fn parse_disk(output: &str) -> ParseResult<Usage> {
        let rows: Vec<Vec<&str>> = output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("Filesystem"))
            .map(|l| l.split_whitespace().collect())
            .collect();

        let row = rows
            .iter()
            .find(|parts| parts.len() >= 6 && parts[5] == "/")
            .or_else(|| rows.first())
            .ok_or(ParseError::Missing("df line"))?;

        if row.len() < 3 {
            return Err(ParseError::Missing("disk used/total"));
        }

        let total_kib = Self::parse_kib("disk total", row[1])?;
        let used_kib = Self::parse_kib("disk used", row[2])?;
        Self::check_usage("disk", used_kib, total_kib)
    }

    fn parse_kib(field: &'static str, token: &str) -> ParseResult<u64> {
        token.parse().map_err(|_| ParseError::NotNumeric {
            field,
            value: token.to_string(),
        })
    }

    fn check_usage(what: &'static str, used_kib: u64, total_kib: u64) -> ParseResult<Usage> {
        if used_kib > total_kib {
            return Err(ParseError::Inverted {
                what,
                used: used_kib,
                total: total_kib,
            });
        }
        Ok(Usage {
            used_kib,
            total_kib,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cpu: &str, memory: &str, disk: &str) -> RawMetrics {
        RawMetrics {
            cpu: cpu.into(),
            memory: memory.into(),
            disk: disk.into(),
        }
    }

    #[test]
    fn test_parse_full_cycle() {
        let now = Utc::now();
        let sample = MetricsParser::parse(
            &raw(
                "25.3\n",
                "16777216 4718592 12058624\n",
                "/dev/sda1 104857600 52428800 52428800 50% /\n",
            ),
            now,
        )
        .unwrap();

        assert!((sample.cpu_percent - 25.3).abs() < f64::EPSILON);
        assert!((sample.mem_used_gb - 4.5).abs() < f64::EPSILON);
        assert!((sample.mem_total_gb - 16.0).abs() < f64::EPSILON);
        assert!((sample.disk_used - 50.0).abs() < f64::EPSILON);
        assert!((sample.disk_total - 100.0).abs() < f64::EPSILON);
        assert_eq!(sample.captured_at, now);
    }

    #[test]
    fn test_cpu_tolerates_whitespace_and_suffixes() {
        assert!((MetricsParser::parse_cpu("\n  7.5%  \n").unwrap() - 7.5).abs() < 1e-9);
        assert!((MetricsParser::parse_cpu("3,2").unwrap() - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_rejects_garbage_and_range() {
        assert!(matches!(
            MetricsParser::parse_cpu(""),
            Err(ParseError::Missing(_))
        ));
        assert!(matches!(
            MetricsParser::parse_cpu("us"),
            Err(ParseError::NotNumeric { .. })
        ));
        assert!(matches!(
            MetricsParser::parse_cpu("101.0"),
            Err(ParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            MetricsParser::parse_cpu("NaN"),
            Err(ParseError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_memory_with_label() {
        let usage =
            MetricsParser::parse_memory("Mem:  8000 2000 6000").unwrap();
        assert_eq!(usage.total_kib, 8000);
        assert_eq!(usage.used_kib, 2000);
    }

    #[test]
    fn test_memory_inverted_is_rejected() {
        assert!(matches!(
            MetricsParser::parse_memory("1000 2000 0"),
            Err(ParseError::Inverted { what: "memory", .. })
        ));
    }

    #[test]
    fn test_empty_totals_are_accepted() {
        let empty = Usage {
            used_kib: 0,
            total_kib: 0,
        };
        assert_eq!(MetricsParser::parse_memory("0 0 0"), Ok(empty));
        assert_eq!(MetricsParser::parse_disk("tmpfs 0 0 0 0% /"), Ok(empty));
    }

    #[test]
    fn test_memory_missing_field() {
        assert!(matches!(
            MetricsParser::parse_memory("16384000"),
            Err(ParseError::Missing(_))
        ));
        assert!(matches!(
            MetricsParser::parse_memory("16384000 lots"),
            Err(ParseError::NotNumeric { field: "memory used", .. })
        ));
    }

    #[test]
    fn test_disk_skips_header_and_prefers_root() {
        let output = "\
Filesystem     1024-blocks     Used Available Capacity Mounted on
/dev/sdb1           200000   100000    100000      50% /data
/dev/sda1           100000    25000     75000      25% /
";
        let usage = MetricsParser::parse_disk(output).unwrap();
        assert_eq!(usage.total_kib, 100_000);
        assert_eq!(usage.used_kib, 25_000);
    }

    #[test]
    fn test_disk_rejects_human_readable_sizes() {
        assert!(matches!(
            MetricsParser::parse_disk("/dev/sda1 100G 50G 50G 50% /"),
            Err(ParseError::NotNumeric { field: "disk total", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_whole_sample_on_one_bad_field() {
        let result = MetricsParser::parse(
            &raw("10.0", "1000 500 500", "garbage"),
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_metric_kind_order() {
        let labels: Vec<_> = MetricKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, ["cpu", "memory", "disk"]);
        assert_eq!(MetricKind::Disk.command(), DISK_COMMAND);
    }
}
