//! Periodic rendering of the snapshot store
//!
//! The display loop never touches a session. It copies the store on its own
//! timer, projects every entry into a [`DisplayRow`] and hands the resulting
//! [`Frame`] to a [`Renderer`]. Hosts without a current sample show
//! [`SENTINEL`] in every numeric column.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::MissedTickBehavior;

use crate::models::HostStatus;
use crate::monitoring::{OrchestratorHandle, ShutdownReport};
use crate::snapshot::{Snapshot, SnapshotEntry, SnapshotStore};

/// Placeholder for a numeric field that has no current value
pub const SENTINEL: &str = "?";

/// Coarse state of a row, used by renderers for coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    /// No result yet
    Connecting,
    /// Fresh sample
    Healthy,
    /// Last cycle failed
    Failed,
}

/// One host's line in the table, already formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    /// Host display name
    pub name: String,
    /// CPU usage, e.g. `25.3%`
    pub cpu: String,
    /// Memory used/total, e.g. `4.5/16.0GB`
    pub memory: String,
    /// Root filesystem used/total, e.g. `50.0/100.0GB`
    pub disk: String,
    /// `ok`, `connecting`, or `<reason> (xN)`
    pub status: String,
    /// Coarse state
    pub state: RowState,
}

impl DisplayRow {
    /// Projects one snapshot entry into display strings
    #[must_use]
    pub fn from_entry(entry: &SnapshotEntry) -> Self {
        let name = entry.name.clone();
        match &entry.status {
            HostStatus::Healthy(sample) => Self {
                name,
                cpu: format!("{:.1}%", sample.cpu_percent),
                memory: format!("{:.1}/{:.1}GB", sample.mem_used_gb, sample.mem_total_gb),
                disk: format!("{:.1}/{:.1}GB", sample.disk_used, sample.disk_total),
                status: "ok".to_string(),
                state: RowState::Healthy,
            },
            HostStatus::Connecting => Self::placeholder(name, "connecting".to_string(), RowState::Connecting),
            HostStatus::Failed(info) => Self::placeholder(
                name,
                format!("{} (x{})", info.reason, info.consecutive_failures),
                RowState::Failed,
            ),
        }
    }

    fn placeholder(name: String, status: String, state: RowState) -> Self {
        Self {
            name,
            cpu: SENTINEL.to_string(),
            memory: SENTINEL.to_string(),
            disk: SENTINEL.to_string(),
            status,
            state,
        }
    }
}

/// Everything a renderer needs for one pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// When the underlying snapshot was copied
    pub taken_at: DateTime<Utc>,
    /// Rows in configuration order
    pub rows: Vec<DisplayRow>,
}

impl From<&Snapshot> for Frame {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            taken_at: snapshot.taken_at,
            rows: snapshot.entries.iter().map(DisplayRow::from_entry).collect(),
        }
    }
}

/// Output side of the display loop.
///
/// Called from the display task; implementations should not block for long.
pub trait Renderer: Send {
    /// Draws one frame
    fn render(&mut self, frame: &Frame);
}

/// Renders the store on a fixed cadence until interrupted
pub struct DisplayLoop<R> {
    store: Arc<SnapshotStore>,
    renderer: R,
    interval: Duration,
}

impl<R: Renderer> DisplayLoop<R> {
    /// Creates a loop reading `store` every `interval`
    #[must_use]
    pub fn new(store: Arc<SnapshotStore>, renderer: R, interval: Duration) -> Self {
        Self {
            store,
            renderer,
            interval,
        }
    }

    /// Renders the current store once
    pub fn render_once(&mut self) {
        let frame = Frame::from(&self.store.snapshot());
        self.renderer.render(&frame);
    }

    /// Renders until `interrupt` completes or the workers' signal fires,
    /// then shuts the workers down and returns the report.
    pub async fn run<F>(mut self, handle: OrchestratorHandle, interrupt: F) -> ShutdownReport
    where
        F: Future<Output = ()>,
    {
        let signal = handle.shutdown_signal();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                biased;
                () = &mut interrupt => {
                    tracing::info!("Interrupt received, stopping");
                    break;
                }
                () = signal.cancelled() => break,
                _ = ticker.tick() => self.render_once(),
            }
        }

        let report = handle.shutdown().await;
        if !report.is_clean() {
            tracing::warn!(
                abandoned = report.abandoned.len(),
                panicked = report.panicked.len(),
                "Shutdown was not clean"
            );
        }
        report
    }
}
