//! Spawns one worker per host and tears them down on shutdown

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::settings::PollTiming;
use super::worker::HostWorker;
use crate::models::HostConfig;
use crate::session::Transport;
use crate::shutdown::ShutdownSignal;
use crate::snapshot::{Snapshot, SnapshotStore};

/// How often [`OrchestratorHandle::wait_until_settled`] re-reads the store
const SETTLE_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Builder for the set of host workers
pub struct PollOrchestrator {
    hosts: Vec<Arc<HostConfig>>,
    transport: Arc<dyn Transport>,
    timing: PollTiming,
}

impl PollOrchestrator {
    /// Creates an orchestrator with default timing
    #[must_use]
    pub fn new(hosts: Vec<Arc<HostConfig>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            hosts,
            transport,
            timing: PollTiming::default(),
        }
    }

    /// Overrides poll interval, backoff and shutdown grace
    #[must_use]
    pub fn with_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Creates the snapshot store and spawns every worker.
    ///
    /// Every host starts as [`crate::HostStatus::Connecting`] and all
    /// workers connect concurrently. A repeated host name is skipped.
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(self) -> OrchestratorHandle {
        let store = Arc::new(SnapshotStore::new(self.hosts.iter().map(|h| h.name.clone())));
        let shutdown = ShutdownSignal::new();
        let mut seen = HashSet::new();
        let mut workers = Vec::with_capacity(self.hosts.len());

        for host in self.hosts {
            if !seen.insert(host.name.clone()) {
                tracing::warn!(host = %host.name, "Duplicate host name, skipping");
                continue;
            }
            let Ok(slot) = store.slot(&host.name) else {
                continue;
            };
            let name = host.name.clone();
            let span = tracing::info_span!("host", name = %name);
            let worker = HostWorker::new(
                host,
                Arc::clone(&self.transport),
                slot,
                self.timing.clone(),
                shutdown.clone(),
            );
            workers.push((name, tokio::spawn(worker.run().instrument(span))));
        }

        tracing::info!(hosts = workers.len(), "Started host workers");

        OrchestratorHandle {
            store,
            shutdown,
            workers,
            grace: self.timing.shutdown_grace,
        }
    }
}

/// Result of [`OrchestratorHandle::shutdown`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers that exited on their own within the grace period
    pub completed: usize,
    /// Workers that panicked
    pub panicked: Vec<String>,
    /// Workers still running at the grace deadline, aborted
    pub abandoned: Vec<String>,
}

impl ShutdownReport {
    /// Returns true if every worker exited cleanly in time
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.panicked.is_empty() && self.abandoned.is_empty()
    }
}

/// Running set of workers plus the store they write to
#[derive(Debug)]
pub struct OrchestratorHandle {
    store: Arc<SnapshotStore>,
    shutdown: ShutdownSignal,
    workers: Vec<(String, JoinHandle<()>)>,
    grace: Duration,
}

impl OrchestratorHandle {
    /// Shared snapshot store
    #[must_use]
    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Signal observed by every worker
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Number of spawned workers
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Waits until no host is still connecting, or until `limit` passes.
    ///
    /// Returns the last snapshot read either way.
    pub async fn wait_until_settled(&self, limit: Duration) -> Snapshot {
        let deadline = tokio::time::Instant::now() + limit;
        let mut ticker = tokio::time::interval(SETTLE_CHECK_INTERVAL);
        loop {
            ticker.tick().await;
            let snapshot = self.store.snapshot();
            if snapshot.all_settled() || tokio::time::Instant::now() >= deadline {
                return snapshot;
            }
        }
    }

    /// Cancels every worker and waits up to the grace period for them to exit.
    ///
    /// Workers still running at the deadline are aborted and reported.
    pub async fn shutdown(mut self) -> ShutdownReport {
        self.shutdown.cancel();
        tracing::info!(
            workers = self.workers.len(),
            grace_ms = u64::try_from(self.grace.as_millis()).unwrap_or(u64::MAX),
            "Shutting down host workers"
        );

        let joined = tokio::time::timeout(
            self.grace,
            join_all(self.workers.iter_mut().map(|(_, handle)| handle)),
        )
        .await;

        let mut report = ShutdownReport::default();
        match joined {
            Ok(results) => {
                for ((name, _), result) in self.workers.iter().zip(results) {
                    match result {
                        Ok(()) => report.completed += 1,
                        Err(err) => {
                            tracing::error!(host = %name, error = %err, "Worker panicked");
                            report.panicked.push(name.clone());
                        }
                    }
                }
            }
            Err(_) => {
                for (name, handle) in self.workers {
                    if handle.is_finished() {
                        report.completed += 1;
                        continue;
                    }
                    tracing::warn!(host = %name, "Worker missed shutdown grace, aborting");
                    handle.abort();
                    // Aborted tasks stop at their next await point; wait so no call follows
                    let _ = handle.await;
                    report.abandoned.push(name);
                }
            }
        }

        report
    }
}
