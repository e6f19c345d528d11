//! Helpers shared by the integration tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use fleetwatch_core::monitoring::{BackoffConfig, OrchestratorHandle, PollOrchestrator, PollTiming};
use fleetwatch_core::testing::FakeTransport;
use fleetwatch_core::{HostStatus, SnapshotStore};

/// Fast timing; failing fake hosts still back off for their 5 s timeout
pub fn fast_timing() -> PollTiming {
    PollTiming {
        poll_interval: Duration::from_millis(30),
        backoff: BackoffConfig::new(),
        shutdown_grace: Duration::from_secs(1),
    }
}

/// Starts one worker per name against `transport`
pub fn start(transport: &FakeTransport, names: &[&str]) -> OrchestratorHandle {
    let hosts = names
        .iter()
        .map(|name| Arc::new(transport.host_config(name)))
        .collect();
    PollOrchestrator::new(hosts, Arc::new(transport.clone()))
        .with_timing(fast_timing())
        .start()
}

/// Polls the store until `predicate` holds for `name`, or panics after `limit`
pub async fn wait_for(
    store: &SnapshotStore,
    name: &str,
    limit: Duration,
    predicate: impl Fn(&HostStatus) -> bool,
) -> HostStatus {
    let started = Instant::now();
    loop {
        let status = store.get(name).unwrap();
        if predicate(&status) {
            return status;
        }
        assert!(
            started.elapsed() < limit,
            "{name} did not reach the expected state, last: {status:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
