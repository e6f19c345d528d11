//! Remote host polling
//!
//! Each host gets one [`HostWorker`] holding its session. A cycle runs the
//! three metric commands, parses their output with [`MetricsParser`] and
//! writes the result into the host's snapshot slot. [`PollOrchestrator`]
//! starts and stops the workers as a group.

mod backoff;
mod metrics;
pub mod orchestrator;
mod parser;
mod settings;
pub mod worker;

pub use backoff::{BackoffConfig, BackoffMode};
pub use metrics::{KIB_PER_GIB, MetricSample, kib_to_gib};
pub use orchestrator::{OrchestratorHandle, PollOrchestrator, ShutdownReport};
pub use parser::{
    CPU_COMMAND, DISK_COMMAND, MEMORY_COMMAND, MetricKind, MetricsParser, RawMetrics, Usage,
};
pub use settings::{MonitorSettings, PollTiming};
pub use worker::{CycleOutcome, HostWorker, WorkerState};
