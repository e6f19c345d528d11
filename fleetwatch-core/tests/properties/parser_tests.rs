//! Property tests for metric output parsing

use fleetwatch_core::ParseError;
use fleetwatch_core::monitoring::{MetricsParser, RawMetrics, Usage, kib_to_gib};
use proptest::prelude::*;

/// Strategy for `(used, total)` pairs with `used <= total`
fn usage_strategy() -> impl Strategy<Value = (u64, u64)> {
    (0u64..1 << 40).prop_flat_map(|total| (0..=total, Just(total)))
}

proptest! {
    /// Property: any in-range CPU value printed by `top` parses back
    #[test]
    fn cpu_value_parses_back(tenths in 0u32..=1000) {
        let printed = format!("{}.{}", tenths / 10, tenths % 10);
        let parsed = MetricsParser::parse_cpu(&format!("  {printed}\n")).unwrap();
        prop_assert!((parsed - f64::from(tenths) / 10.0).abs() < 1e-9);
    }

    /// Property: CPU values above 100 are rejected, never clamped
    #[test]
    fn cpu_above_hundred_rejected(value in 100.1f64..1e6) {
        let result = MetricsParser::parse_cpu(&format!("{value:.1}"));
        let is_out_of_range = matches!(result, Err(ParseError::OutOfRange { .. }));
        prop_assert!(is_out_of_range);
    }

    /// Property: `free -k` style lines yield exactly the printed fields
    #[test]
    fn memory_line_parses_back((used, total) in usage_strategy(), labelled in any::<bool>()) {
        let free = total - used;
        let line = if labelled {
            format!("Mem: {total} {used} {free}")
        } else {
            format!("{total} {used} {free}")
        };
        let usage = MetricsParser::parse_memory(&line).unwrap();
        prop_assert_eq!(usage, Usage { used_kib: used, total_kib: total });
    }

    /// Property: used > total is a parse failure for memory and disk
    #[test]
    fn inverted_usage_rejected(total in 1u64..1 << 40, extra in 1u64..1 << 20) {
        let used = total + extra;
        let memory = MetricsParser::parse_memory(&format!("{total} {used} 0"));
        let memory_inverted = matches!(memory, Err(ParseError::Inverted { .. }));
        prop_assert!(memory_inverted);

        let disk = MetricsParser::parse_disk(&format!("/dev/sda1 {total} {used} 0 100% /"));
        let disk_inverted = matches!(disk, Err(ParseError::Inverted { .. }));
        prop_assert!(disk_inverted);
    }

    /// Property: the root mount is picked regardless of its position
    #[test]
    fn disk_prefers_root_mount((used, total) in usage_strategy(), before in 0usize..4) {
        let mut output = String::from("Filesystem 1024-blocks Used Available Capacity Mounted on\n");
        for i in 0..before {
            output.push_str(&format!("/dev/sdb{i} 10 5 5 50% /data{i}\n"));
        }
        output.push_str(&format!("/dev/sda1 {total} {used} {} 1% /\n", total - used));
        let usage = MetricsParser::parse_disk(&output).unwrap();
        prop_assert_eq!(usage, Usage { used_kib: used, total_kib: total });
    }

    /// Property: a whole sample is rejected when any single output is garbage
    #[test]
    fn garbage_in_any_field_rejects_sample(field in 0usize..3, junk in "[a-zA-Z]{1,12}") {
        let mut raw = RawMetrics {
            cpu: "12.5".into(),
            memory: "1048576 524288 524288".into(),
            disk: "/dev/sda1 2097152 1048576 1048576 50% /".into(),
        };
        match field {
            0 => raw.cpu = junk,
            1 => raw.memory = junk,
            _ => raw.disk = junk,
        }
        prop_assert!(MetricsParser::parse(&raw, chrono::Utc::now()).is_err());
    }

    /// Property: parsing is deterministic
    #[test]
    fn parse_is_deterministic((used, total) in usage_strategy()) {
        let raw = RawMetrics {
            cpu: "3.0".into(),
            memory: format!("{total} {used} 0"),
            disk: format!("/dev/root {total} {used} 0 0% /"),
        };
        let at = chrono::Utc::now();
        let a = MetricsParser::parse(&raw, at).unwrap();
        let b = MetricsParser::parse(&raw, at).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert!((a.mem_total_gb - kib_to_gib(total)).abs() < f64::EPSILON);
        prop_assert!(a.mem_used_gb <= a.mem_total_gb);
    }
}
