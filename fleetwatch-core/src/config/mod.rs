//! Configuration loading for fleetwatch
//!
//! A single file lists the servers to monitor and, optionally, a `monitor`
//! section with polling and display timing. JSON, TOML and YAML are accepted.

mod fleet;
pub mod paths;

pub use fleet::{ConfigFormat, FleetConfig, ServerEntry};
pub use paths::{CONFIG_ENV, default_config_path, default_log_path, resolve_config_path};
