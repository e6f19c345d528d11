//! Property tests for post-failure backoff

use std::time::Duration;

use fleetwatch_core::monitoring::{BackoffConfig, BackoffMode};
use proptest::prelude::*;

fn backoff_strategy() -> impl Strategy<Value = BackoffConfig> {
    (any::<bool>(), 1.0f64..5.0, 0u64..120_000).prop_map(|(exponential, multiplier, max_delay_ms)| {
        let base = if exponential {
            BackoffConfig::exponential()
        } else {
            BackoffConfig::new()
        };
        base.with_multiplier(multiplier)
            .with_max_delay_ms(max_delay_ms)
    })
}

proptest! {
    /// Property: every delay lies between the 100 ms floor and the cap
    #[test]
    fn delay_within_bounds(
        config in backoff_strategy(),
        timeout_ms in 0u64..600_000,
        failures in 0u32..200,
    ) {
        let delay = config.delay(Duration::from_millis(timeout_ms), failures);
        prop_assert!(delay >= Duration::from_millis(100));
        prop_assert!(delay <= Duration::from_millis(config.max_delay_ms.max(100)));
    }

    /// Property: fixed mode ignores the failure count
    #[test]
    fn fixed_ignores_failure_count(timeout_ms in 100u64..30_000, a in 1u32..50, b in 1u32..50) {
        let config = BackoffConfig::new();
        prop_assert_eq!(config.mode, BackoffMode::Fixed);
        let timeout = Duration::from_millis(timeout_ms);
        prop_assert_eq!(config.delay(timeout, a), config.delay(timeout, b));
        prop_assert_eq!(config.delay(timeout, a), timeout);
    }

    /// Property: exponential delays never shrink as failures accumulate
    #[test]
    fn exponential_is_monotonic(config in backoff_strategy(), timeout_ms in 100u64..10_000) {
        let timeout = Duration::from_millis(timeout_ms);
        let mut previous = Duration::ZERO;
        for failures in 1..40 {
            let delay = config.delay(timeout, failures);
            prop_assert!(delay >= previous);
            previous = delay;
        }
    }
}
