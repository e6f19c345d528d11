//! Remote command execution capability
//!
//! The polling engine only needs three operations: open a session, run a
//! command on it, close it. [`Transport`] opens sessions; [`Session`] runs
//! commands and closes itself. [`ssh::SshTransport`] drives the system OpenSSH
//! client; tests use [`crate::testing::FakeTransport`].

pub mod ssh;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CommandError, ConnectError};
use crate::models::HostConfig;

pub use ssh::SshTransport;

/// Output of one remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: String,
    /// Exit status of the remote command
    pub exit_code: i32,
}

impl CommandOutput {
    /// Creates a successful output
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: 0,
        }
    }

    /// Returns true when the command exited with status 0
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Opens sessions to remote hosts
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a live session to `host`, bounded by `host.timeout`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectError`] classifying why the session could not be
    /// established.
    async fn connect(&self, host: &HostConfig) -> Result<Box<dyn Session>, ConnectError>;
}

/// A live authenticated command channel to one host.
///
/// Owned by exactly one worker; never shared.
#[async_trait]
pub trait Session: Send {
    /// Runs `command`, bounded by `timeout`.
    ///
    /// A non-zero exit status is returned in [`CommandOutput::exit_code`],
    /// not as an error.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] on timeout or transport failure.
    async fn run(&mut self, command: &str, timeout: Duration)
    -> Result<CommandOutput, CommandError>;

    /// Cheap liveness probe used before reusing the session for a new cycle
    async fn is_alive(&mut self) -> bool {
        true
    }

    /// Releases the session. Failures are logged by the implementation.
    async fn close(self: Box<Self>);
}
