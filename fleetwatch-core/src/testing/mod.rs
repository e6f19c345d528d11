//! In-memory transport and renderer for exercising the polling engine
//!
//! [`FakeTransport`] serves scripted command output per host and counts
//! every connect, run and close it receives, so tests can assert that no
//! remote call happens after shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::display::{Frame, Renderer};
use crate::error::{CommandError, ConnectError};
use crate::models::{Credentials, HostConfig};
use crate::monitoring::MetricKind;
use crate::session::{CommandOutput, Session, Transport};

/// Timeout given to hosts built by [`FakeTransport::host_config`]
pub const FAKE_HOST_TIMEOUT: Duration = Duration::from_secs(5);

/// CPU output of a healthy fake host (25.3 %)
pub const HEALTHY_CPU: &str = "25.3\n";
/// Memory output of a healthy fake host (4.5 of 16 GiB used)
pub const HEALTHY_MEMORY: &str = "16777216 4718592 12058624\n";
/// Disk output of a healthy fake host (50 of 100 GiB used)
pub const HEALTHY_DISK: &str = "/dev/sda1 104857600 52428800 52428800 50% /\n";

/// Scripted behavior of one fake host
#[derive(Debug, Clone)]
pub struct FakeHost {
    cpu: String,
    memory: String,
    disk: String,
    exit_code: i32,
    connect_error: Option<ConnectError>,
    failing_connects: u32,
    connect_delay: Duration,
    run_delay: Duration,
    runs_before_drop: Option<usize>,
}

impl FakeHost {
    /// Host that connects and reports [`HEALTHY_CPU`], [`HEALTHY_MEMORY`], [`HEALTHY_DISK`]
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            cpu: HEALTHY_CPU.to_string(),
            memory: HEALTHY_MEMORY.to_string(),
            disk: HEALTHY_DISK.to_string(),
            exit_code: 0,
            connect_error: None,
            failing_connects: 0,
            connect_delay: Duration::ZERO,
            run_delay: Duration::ZERO,
            runs_before_drop: None,
        }
    }

    /// Host whose every connect fails as unreachable
    #[must_use]
    pub fn unreachable() -> Self {
        Self::healthy().with_connect_error(ConnectError::Unreachable("connection refused".into()))
    }

    /// Every connect fails with `error`
    #[must_use]
    pub fn with_connect_error(mut self, error: ConnectError) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// The first `count` connects fail as unreachable, later ones succeed
    #[must_use]
    pub const fn fail_connects(mut self, count: u32) -> Self {
        self.failing_connects = count;
        self
    }

    /// Replaces the CPU command output
    #[must_use]
    pub fn with_cpu_output(mut self, output: impl Into<String>) -> Self {
        self.cpu = output.into();
        self
    }

    /// Replaces the memory command output
    #[must_use]
    pub fn with_memory_output(mut self, output: impl Into<String>) -> Self {
        self.memory = output.into();
        self
    }

    /// Replaces the disk command output
    #[must_use]
    pub fn with_disk_output(mut self, output: impl Into<String>) -> Self {
        self.disk = output.into();
        self
    }

    /// Exit status returned by every command
    #[must_use]
    pub const fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Delay before each connect completes
    #[must_use]
    pub const fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Delay before each command completes
    #[must_use]
    pub const fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// After `runs` successful commands in total, every further command
    /// fails as a dropped transport. Three commands make one cycle.
    #[must_use]
    pub const fn drop_after_runs(mut self, runs: usize) -> Self {
        self.runs_before_drop = Some(runs);
        self
    }

    fn output_for(&self, command: &str) -> Option<&str> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.command() == command)
            .map(|kind| match kind {
                MetricKind::Cpu => self.cpu.as_str(),
                MetricKind::Memory => self.memory.as_str(),
                MetricKind::Disk => self.disk.as_str(),
            })
    }
}

/// Remote calls received for one host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    /// `connect` calls
    pub connects: usize,
    /// `run` calls
    pub runs: usize,
    /// `close` calls
    pub closes: usize,
}

impl CallStats {
    /// Connects plus runs; closes are local cleanup
    #[must_use]
    pub const fn total(&self) -> usize {
        self.connects + self.runs
    }
}

#[derive(Debug)]
struct HostState {
    script: FakeHost,
    stats: CallStats,
}

type Hosts = Arc<Mutex<HashMap<String, HostState>>>;

fn lock(hosts: &Hosts) -> MutexGuard<'_, HashMap<String, HostState>> {
    hosts.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted [`Transport`]; clones share scripts and counters.
///
/// Hosts are keyed by hostname. Connecting to an unscripted hostname fails
/// as unreachable.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    hosts: Hosts,
}

impl FakeTransport {
    /// Creates a transport with no hosts
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `hostname`, replacing any previous script and counters
    pub fn add_host(&self, hostname: &str, script: FakeHost) {
        lock(&self.hosts).insert(
            hostname.to_string(),
            HostState {
                script,
                stats: CallStats::default(),
            },
        );
    }

    /// Host named and addressed `name`, with [`FAKE_HOST_TIMEOUT`]
    #[must_use]
    pub fn host_config(&self, name: &str) -> HostConfig {
        HostConfig::new(name, name, Credentials::new("tester")).with_timeout(FAKE_HOST_TIMEOUT)
    }

    /// Calls received for `hostname` so far
    #[must_use]
    pub fn stats(&self, hostname: &str) -> CallStats {
        lock(&self.hosts)
            .get(hostname)
            .map(|h| h.stats)
            .unwrap_or_default()
    }

    /// Connects plus runs across every host
    #[must_use]
    pub fn total_calls(&self) -> usize {
        lock(&self.hosts).values().map(|h| h.stats.total()).sum()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, host: &HostConfig) -> Result<Box<dyn Session>, ConnectError> {
        let (delay, result) = {
            let mut hosts = lock(&self.hosts);
            let Some(state) = hosts.get_mut(&host.hostname) else {
                return Err(ConnectError::Unreachable(format!(
                    "no route to {}",
                    host.hostname
                )));
            };
            state.stats.connects += 1;
            let result = if let Some(err) = &state.script.connect_error {
                Err(err.clone())
            } else if state.script.failing_connects > 0 {
                state.script.failing_connects -= 1;
                Err(ConnectError::Unreachable("connection refused".into()))
            } else {
                Ok(())
            };
            (state.script.connect_delay, result)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result?;

        Ok(Box::new(FakeSession {
            hostname: host.hostname.clone(),
            hosts: Arc::clone(&self.hosts),
        }))
    }
}

struct FakeSession {
    hostname: String,
    hosts: Hosts,
}

#[async_trait]
impl Session for FakeSession {
    async fn run(
        &mut self,
        command: &str,
        _timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let (delay, result) = {
            let mut hosts = lock(&self.hosts);
            let Some(state) = hosts.get_mut(&self.hostname) else {
                return Err(CommandError::Transport("host removed".into()));
            };
            let previous_runs = state.stats.runs;
            state.stats.runs += 1;

            let script = &state.script;
            let result = if script.runs_before_drop.is_some_and(|limit| previous_runs >= limit) {
                Err(CommandError::Transport("connection reset by peer".into()))
            } else {
                Ok(script.output_for(command).map_or_else(
                    || CommandOutput {
                        stdout: String::new(),
                        exit_code: 127,
                    },
                    |stdout| CommandOutput {
                        stdout: stdout.to_string(),
                        exit_code: script.exit_code,
                    },
                ))
            };
            (script.run_delay, result)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn close(self: Box<Self>) {
        if let Some(state) = lock(&self.hosts).get_mut(&self.hostname) {
            state.stats.closes += 1;
        }
    }
}

/// [`Renderer`] that keeps every frame; clones share the frame list
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl RecordingRenderer {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent frame
    #[must_use]
    pub fn last(&self) -> Option<Frame> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &Frame) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.clone());
    }
}
