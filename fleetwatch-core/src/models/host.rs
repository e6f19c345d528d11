//! Per-host connection settings

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Default connect/command timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Largest accepted per-host timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Authentication material for one host.
///
/// The password never appears in `Debug` output.
pub struct Credentials {
    /// Remote login name
    pub username: String,
    /// Password for `sshpass`-driven authentication
    pub password: Option<SecretString>,
    /// Private key passed to `ssh -i`
    pub key_file: Option<PathBuf>,
}

impl Credentials {
    /// Creates key/agent based credentials for `username`
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            key_file: None,
        }
    }

    /// Sets the password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Sets the private key path
    #[must_use]
    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = Some(path.into());
        self
    }

    /// Returns the password, if any
    #[must_use]
    pub fn expose_password(&self) -> Option<&str> {
        self.password.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Human-readable authentication method for listings
    #[must_use]
    pub fn auth_method(&self) -> &'static str {
        if self.password.is_some() {
            "password"
        } else if self.key_file.is_some() {
            "key"
        } else {
            "agent"
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("key_file", &self.key_file)
            .finish()
    }
}

/// One configured remote target.
///
/// Built once from the configuration file and shared read-only with the
/// host's worker for the life of the process.
#[derive(Debug)]
pub struct HostConfig {
    /// Unique display name (table key)
    pub name: String,
    /// DNS name or address
    pub hostname: String,
    /// SSH port
    pub port: u16,
    /// Authentication material
    pub credentials: Credentials,
    /// Bound on connect and on each remote command
    pub timeout: Duration,
}

impl HostConfig {
    /// Creates a host with default port and timeout
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        hostname: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            credentials,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `user@hostname` destination string for ssh
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.credentials.username, self.hostname)
    }
}
