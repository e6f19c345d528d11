//! Core data structures shared by the worker, store and display loop

mod host;
mod status;

pub use host::{Credentials, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, HostConfig, MAX_TIMEOUT_SECS};
pub use status::{FailureInfo, FailureReason, HostStatus};
