//! Per-host session worker
//!
//! One worker owns one host for the life of the process:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> (Polling -> Connected)* -> Disconnected
//! ```
//!
//! Any failure while connecting or polling drops the session, writes
//! [`HostStatus::Failed`], waits the backoff and reconnects. There is no
//! terminal failure state; only the shutdown signal ends the loop.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use super::parser::{MetricKind, MetricsParser, RawMetrics};
use super::settings::PollTiming;
use crate::error::CommandError;
use crate::models::{FailureInfo, FailureReason, HostConfig, HostStatus};
use crate::session::{Session, Transport};
use crate::shutdown::ShutdownSignal;
use crate::snapshot::HostSlot;

/// Connection state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No live session
    Disconnected,
    /// Connect in flight
    Connecting,
    /// Live session, idle between cycles
    Connected,
    /// Metric commands in flight
    Polling,
}

/// How a single cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fresh sample written
    Healthy,
    /// Failure written; the session has been dropped
    Failed(FailureReason),
    /// Shutdown observed mid-cycle
    Cancelled,
}

/// Maintains one host's session and refreshes its slot until cancelled
pub struct HostWorker {
    host: Arc<HostConfig>,
    transport: Arc<dyn Transport>,
    slot: HostSlot,
    timing: PollTiming,
    shutdown: ShutdownSignal,
    session: Option<Box<dyn Session>>,
    state: WorkerState,
    consecutive_failures: u32,
}

impl HostWorker {
    /// Creates a worker writing to `slot`
    #[must_use]
    pub fn new(
        host: Arc<HostConfig>,
        transport: Arc<dyn Transport>,
        slot: HostSlot,
        timing: PollTiming,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            host,
            transport,
            slot,
            timing,
            shutdown,
            session: None,
            state: WorkerState::Disconnected,
            consecutive_failures: 0,
        }
    }

    /// Current connection state
    #[must_use]
    pub const fn state(&self) -> WorkerState {
        self.state
    }

    /// Failed cycles since the last healthy one
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Runs cycles until the shutdown signal fires, then closes the session
    pub async fn run(mut self) {
        tracing::debug!(hostname = %self.host.hostname, port = self.host.port, "Worker started");

        while !self.shutdown.is_cancelled() {
            let outcome = self.cycle().await;
            let delay = match outcome {
                CycleOutcome::Healthy => self.timing.poll_interval,
                CycleOutcome::Failed(_) => self
                    .timing
                    .backoff
                    .delay(self.host.timeout, self.consecutive_failures),
                CycleOutcome::Cancelled => break,
            };

            if until_cancelled(&self.shutdown, tokio::time::sleep(delay))
                .await
                .is_none()
            {
                break;
            }
        }

        self.drop_session().await;
        tracing::debug!("Worker stopped");
    }

    /// Runs one connect-if-needed + poll cycle and records its result
    pub async fn cycle(&mut self) -> CycleOutcome {
        if let Some(session) = self.session.as_mut() {
            let alive = until_cancelled(&self.shutdown, session.is_alive()).await;
            match alive {
                None => return CycleOutcome::Cancelled,
                Some(true) => {}
                Some(false) => {
                    tracing::info!("Session went stale, reconnecting");
                    self.drop_session().await;
                }
            }
        }

        if self.session.is_none() {
            self.transition(WorkerState::Connecting);
            tracing::debug!("Connecting");
            let connected =
                until_cancelled(&self.shutdown, self.transport.connect(&self.host)).await;
            match connected {
                None => {
                    self.transition(WorkerState::Disconnected);
                    return CycleOutcome::Cancelled;
                }
                Some(Ok(session)) => {
                    tracing::info!(hostname = %self.host.hostname, "Connected");
                    self.session = Some(session);
                    self.transition(WorkerState::Connected);
                }
                Some(Err(err)) => {
                    self.transition(WorkerState::Disconnected);
                    tracing::warn!(
                        reason = %err.reason(),
                        failures = self.consecutive_failures + 1,
                        error = %err,
                        "Connect failed"
                    );
                    return self.record_failure(err.reason());
                }
            }
        }

        self.poll().await
    }

    async fn poll(&mut self) -> CycleOutcome {
        let Some(session) = self.session.as_mut() else {
            return CycleOutcome::Cancelled;
        };
        self.state = WorkerState::Polling;

        let mut raw = RawMetrics::default();
        for kind in MetricKind::ALL {
            let result =
                match until_cancelled(&self.shutdown, session.run(kind.command(), self.host.timeout))
                    .await
                {
                    None => return CycleOutcome::Cancelled,
                    Some(result) => result,
                };

            let failure = match result {
                Ok(output) if output.success() => {
                    raw.set(kind, output.stdout);
                    continue;
                }
                Ok(output) => CommandError::NonZeroExit {
                    code: output.exit_code,
                },
                Err(err) => err,
            };

            tracing::warn!(
                metric = kind.label(),
                reason = %failure.reason(),
                failures = self.consecutive_failures + 1,
                error = %failure,
                "Metric command failed"
            );
            self.drop_session().await;
            return self.record_failure(failure.reason());
        }

        match MetricsParser::parse(&raw, Utc::now()) {
            Ok(sample) => {
                self.transition(WorkerState::Connected);
                if self.consecutive_failures > 0 {
                    tracing::info!(after = self.consecutive_failures, "Host recovered");
                }
                self.consecutive_failures = 0;
                self.slot.set(HostStatus::Healthy(sample));
                CycleOutcome::Healthy
            }
            Err(err) => {
                tracing::warn!(
                    reason = %err.reason(),
                    failures = self.consecutive_failures + 1,
                    error = %err,
                    "Metric output rejected"
                );
                self.drop_session().await;
                self.record_failure(err.reason())
            }
        }
    }

    fn record_failure(&mut self, reason: FailureReason) -> CycleOutcome {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.slot.set(HostStatus::Failed(FailureInfo {
            reason,
            last_attempt: Utc::now(),
            consecutive_failures: self.consecutive_failures,
        }));
        CycleOutcome::Failed(reason)
    }

    async fn drop_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
        self.transition(WorkerState::Disconnected);
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "Worker state change");
            self.state = next;
        }
    }
}

/// Races `fut` against the shutdown signal.
///
/// Returns `None` without polling `fut` if the signal already fired.
pub(crate) async fn until_cancelled<F: Future>(signal: &ShutdownSignal, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = signal.cancelled() => None,
        output = fut => Some(output),
    }
}
