//! Property tests for worker failure counting

use std::sync::Arc;
use std::time::Duration;

use fleetwatch_core::monitoring::{BackoffConfig, CycleOutcome, HostWorker, PollTiming};
use fleetwatch_core::testing::{FakeHost, FakeTransport};
use fleetwatch_core::{ShutdownSignal, SnapshotStore};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn timing() -> PollTiming {
    PollTiming {
        poll_interval: Duration::from_millis(10),
        backoff: BackoffConfig::new(),
        shutdown_grace: Duration::from_secs(1),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the stored failure count climbs 1, 2, ... across failing
    /// cycles and resets to zero on the first healthy one
    #[test]
    fn failure_count_is_monotonic_until_recovery(failing in 0u32..12) {
        let transport = FakeTransport::new();
        transport.add_host("h", FakeHost::healthy().fail_connects(failing));
        let store = Arc::new(SnapshotStore::new(["h"]));
        let mut worker = HostWorker::new(
            Arc::new(transport.host_config("h")),
            Arc::new(transport.clone()),
            store.slot("h").unwrap(),
            timing(),
            ShutdownSignal::new(),
        );

        let observed = runtime().block_on(async {
            let mut counts = Vec::new();
            for _ in 0..=failing {
                let outcome = worker.cycle().await;
                counts.push((outcome, store.get("h").unwrap().consecutive_failures()));
            }
            counts
        });

        for (idx, (outcome, count)) in observed.iter().enumerate() {
            if idx < failing as usize {
                prop_assert!(matches!(outcome, CycleOutcome::Failed(_)));
                prop_assert_eq!(*count, idx as u32 + 1);
            } else {
                prop_assert_eq!(*outcome, CycleOutcome::Healthy);
                prop_assert_eq!(*count, 0);
            }
        }
        prop_assert_eq!(transport.stats("h").connects, failing as usize + 1);
    }
}
