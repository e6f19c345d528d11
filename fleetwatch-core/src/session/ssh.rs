//! OpenSSH-backed transport
//!
//! Each session is an OpenSSH ControlMaster process (`ssh -M -N`) owned by
//! the worker. Metric commands are multiplexed over its control socket, so a
//! poll cycle costs no new handshake. Password hosts go through `sshpass -e`
//! when it is installed.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use uuid::Uuid;

use super::{CommandOutput, Session, Transport};
use crate::error::{CommandError, ConnectError};
use crate::models::HostConfig;

/// How often connect checks whether the control socket is up
const MASTER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bound on control commands (`-O check`, `-O exit`)
pub(crate) const CONTROL_TIMEOUT: Duration = Duration::from_secs(2);

/// Exit status ssh uses for its own (non-remote) failures
const SSH_ERROR_EXIT: i32 = 255;

/// Opens sessions through the system `ssh` client
#[derive(Debug, Clone)]
pub struct SshTransport {
    control_dir: PathBuf,
    sshpass_available: bool,
}

impl SshTransport {
    /// Creates a transport placing control sockets in the temp directory
    #[must_use]
    pub fn new() -> Self {
        Self::with_control_dir(std::env::temp_dir())
    }

    /// Creates a transport placing control sockets in `dir`
    #[must_use]
    pub fn with_control_dir(dir: impl Into<PathBuf>) -> Self {
        // Check sshpass availability once at construction time
        let sshpass_available = std::process::Command::new("sshpass")
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();

        Self {
            control_dir: dir.into(),
            sshpass_available,
        }
    }

    fn control_path(&self) -> PathBuf {
        let id = Uuid::new_v4().simple().to_string();
        self.control_dir.join(format!("fleetwatch-{}.sock", &id[..12]))
    }

    fn master_command(&self, host: &HostConfig, control_path: &Path) -> Result<Command, ConnectError> {
        let mut cmd = if let Some(password) = host.credentials.expose_password() {
            if !self.sshpass_available {
                return Err(ConnectError::Transport(
                    "password authentication requires sshpass".into(),
                ));
            }
            let mut cmd = Command::new("sshpass");
            // sshpass reads SSHPASS with -e
            cmd.arg("-e").arg("ssh").env("SSHPASS", password);
            cmd
        } else {
            let mut cmd = Command::new("ssh");
            cmd.arg("-o").arg("BatchMode=yes");
            cmd
        };

        cmd.arg("-o").arg("StrictHostKeyChecking=accept-new");
        cmd.arg("-o")
            .arg(format!("ConnectTimeout={}", connect_timeout_secs(host)));
        cmd.arg("-o").arg("ServerAliveInterval=15");
        cmd.arg("-o").arg("ControlMaster=yes");
        cmd.arg("-o").arg(format!("ControlPath={}", control_path.display()));
        cmd.arg("-p").arg(host.port.to_string());
        if let Some(key) = &host.credentials.key_file {
            cmd.arg("-i").arg(key);
        }
        cmd.arg("-N").arg(host.destination());

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd)
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn connect(&self, host: &HostConfig) -> Result<Box<dyn Session>, ConnectError> {
        let control_path = self.control_path();
        let mut master = self
            .master_command(host, &control_path)?
            .spawn()
            .map_err(|e| ConnectError::Transport(format!("failed to spawn ssh: {e}")))?;

        let destination = host.destination();
        // An unrepresentable deadline means connect is bounded only by ssh itself
        let deadline = Instant::now().checked_add(host.timeout);

        loop {
            match master.try_wait() {
                Ok(Some(status)) => {
                    let stderr = drain_stderr(&mut master).await;
                    return Err(classify_connect_failure(&stderr, status, host.timeout));
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(ConnectError::Transport(format!("failed to poll ssh: {e}")));
                }
            }

            if control_check(&destination, &control_path).await {
                tracing::debug!(host = %host.name, socket = %control_path.display(), "Control master ready");
                return Ok(Box::new(SshSession {
                    destination,
                    control_path,
                    port: host.port,
                    connect_timeout_secs: connect_timeout_secs(host),
                    master,
                }));
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = master.kill().await;
                let _ = tokio::fs::remove_file(&control_path).await;
                return Err(ConnectError::Timeout(host.timeout));
            }

            tokio::time::sleep(MASTER_POLL_INTERVAL).await;
        }
    }
}

/// A live ControlMaster connection
#[derive(Debug)]
pub struct SshSession {
    destination: String,
    control_path: PathBuf,
    port: u16,
    connect_timeout_secs: u64,
    master: Child,
}

impl SshSession {
    /// A mux client whose socket is gone falls back to a direct connection,
    /// so it carries the same port and connect bound as the master.
    fn mux_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(mux_options(
            &self.control_path,
            self.port,
            self.connect_timeout_secs,
        ));
        cmd.kill_on_drop(true);
        cmd
    }

    /// Returns why the master can no longer carry commands, if it cannot
    fn master_gone(&mut self) -> Option<String> {
        match self.master.try_wait() {
            Ok(Some(status)) => Some(format!("control master exited ({status})")),
            Err(e) => Some(format!("failed to poll control master: {e}")),
            Ok(None) if !self.control_path.exists() => Some(format!(
                "control socket {} is gone",
                self.control_path.display()
            )),
            Ok(None) => None,
        }
    }
}

/// Options shared by every command multiplexed over a control socket
fn mux_options(control_path: &Path, port: u16, connect_timeout_secs: u64) -> Vec<String> {
    vec![
        "-o".into(),
        format!("ControlPath={}", control_path.display()),
        "-o".into(),
        "ControlMaster=no".into(),
        "-o".into(),
        "BatchMode=yes".into(),
        "-o".into(),
        format!("ConnectTimeout={connect_timeout_secs}"),
        "-p".into(),
        port.to_string(),
    ]
}

fn connect_timeout_secs(host: &HostConfig) -> u64 {
    host.timeout.as_secs().max(1)
}

#[async_trait]
impl Session for SshSession {
    async fn run(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        if let Some(why) = self.master_gone() {
            return Err(CommandError::Transport(why));
        }

        let mut cmd = self.mux_command();
        cmd.arg(&self.destination)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => match output.status.code() {
                Some(SSH_ERROR_EXIT) | None => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(CommandError::Transport(format!(
                        "ssh failed ({}): {}",
                        output.status,
                        stderr.trim()
                    )))
                }
                Some(exit_code) => Ok(CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    exit_code,
                }),
            },
            Ok(Err(e)) => Err(CommandError::Transport(format!(
                "failed to spawn ssh: {e}"
            ))),
            Err(_) => Err(CommandError::Timeout(timeout)),
        }
    }

    async fn is_alive(&mut self) -> bool {
        self.master_gone().is_none()
            && control_check(&self.destination, &self.control_path).await
    }

    async fn close(mut self: Box<Self>) {
        let mut cmd = self.mux_command();
        cmd.arg("-O")
            .arg("exit")
            .arg(&self.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        match tokio::time::timeout(CONTROL_TIMEOUT, cmd.status()).await {
            Ok(Ok(status)) if status.success() => {}
            Ok(Ok(status)) => {
                tracing::debug!(destination = %self.destination, %status, "ssh -O exit failed");
            }
            Ok(Err(e)) => {
                tracing::warn!(destination = %self.destination, error = %e, "Failed to spawn ssh -O exit");
            }
            Err(_) => {
                tracing::warn!(destination = %self.destination, "ssh -O exit timed out");
            }
        }

        if let Err(e) = self.master.kill().await {
            tracing::debug!(destination = %self.destination, error = %e, "Control master already gone");
        }
        if let Err(e) = tokio::fs::remove_file(&self.control_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(socket = %self.control_path.display(), error = %e, "Failed to remove control socket");
        }
    }
}

/// Returns true when the control master at `control_path` answers `-O check`
async fn control_check(destination: &str, control_path: &Path) -> bool {
    let mut cmd = Command::new("ssh");
    cmd.arg("-o")
        .arg(format!("ControlPath={}", control_path.display()))
        .arg("-O")
        .arg("check")
        .arg(destination)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    matches!(
        tokio::time::timeout(CONTROL_TIMEOUT, cmd.status()).await,
        Ok(Ok(status)) if status.success()
    )
}

async fn drain_stderr(child: &mut Child) -> String {
    let mut buf = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut buf).await;
    }
    buf
}

/// Maps ssh's stderr after a failed connect to a [`ConnectError`]
pub(crate) fn classify_connect_failure(
    stderr: &str,
    status: ExitStatus,
    timeout: Duration,
) -> ConnectError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().lines().last().unwrap_or("").to_string();

    if lower.contains("permission denied") || lower.contains("authentication fail") {
        ConnectError::Auth(message)
    } else if lower.contains("timed out") {
        ConnectError::Timeout(timeout)
    } else if lower.contains("could not resolve")
        || lower.contains("name or service not known")
        || lower.contains("connection refused")
        || lower.contains("no route to host")
        || lower.contains("network is unreachable")
        || lower.contains("host is down")
    {
        ConnectError::Unreachable(message)
    } else if message.is_empty() {
        ConnectError::Transport(format!("ssh exited with {status}"))
    } else {
        ConnectError::Transport(message)
    }
}
