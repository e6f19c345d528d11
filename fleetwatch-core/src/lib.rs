//! Fleetwatch Core Library
//!
//! Polling engine for a multi-host resource monitor: one worker per remote
//! host keeps a session open, samples CPU, memory and root disk usage, and
//! publishes the result into a shared snapshot that a display loop renders
//! on its own cadence.
//!
//! # Crate Structure
//!
//! - [`models`] - Host configuration and per-host status
//! - [`config`] - Configuration file loading and validation
//! - [`session`] - Remote command transport (`OpenSSH` client)
//! - [`monitoring`] - Metric parsing, backoff, workers and orchestration
//! - [`snapshot`] - Last-known status of every host
//! - [`display`] - Row formatting and the render loop
//! - [`testing`] - Scripted transport and recording renderer

#![warn(missing_docs)]

pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod session;
pub mod shutdown;
pub mod snapshot;
pub mod testing;
pub mod tracing;

pub use config::{ConfigFormat, FleetConfig, ServerEntry};
pub use display::{DisplayLoop, DisplayRow, Frame, Renderer, RowState, SENTINEL};
pub use error::{
    CommandError, ConfigError, ConfigResult, ConnectError, FleetError, FleetResult, ParseError,
    StoreError,
};
pub use models::{Credentials, FailureInfo, FailureReason, HostConfig, HostStatus};
pub use monitoring::{
    BackoffConfig, BackoffMode, MetricSample, MetricsParser, MonitorSettings, OrchestratorHandle,
    PollOrchestrator, PollTiming, ShutdownReport,
};
pub use session::{CommandOutput, Session, SshTransport, Transport};
pub use shutdown::ShutdownSignal;
pub use snapshot::{Snapshot, SnapshotEntry, SnapshotStore};
pub use self::tracing::{TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing};
