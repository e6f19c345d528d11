//! Fleet configuration file

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, ConfigResult};
use crate::models::{Credentials, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, HostConfig, MAX_TIMEOUT_SECS};
use crate::monitoring::MonitorSettings;

/// On-disk format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
}

impl ConfigFormat {
    /// Detects the format of `path` from its extension
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// One `servers` entry as written in the file
#[derive(Deserialize)]
pub struct ServerEntry {
    /// Unique display name
    pub name: String,
    /// DNS name or address
    pub hostname: String,
    /// Remote login name
    pub username: String,
    /// Inline password
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// Environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,
    /// Private key path; `~` and `$VAR` are expanded
    #[serde(default)]
    pub key_filename: Option<String>,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connect and command timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl fmt::Debug for ServerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEntry")
            .field("name", &self.name)
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("password_env", &self.password_env)
            .field("key_filename", &self.key_filename)
            .field("port", &self.port)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ServerEntry {
    /// Builds the runtime host, resolving `password_env` and expanding the key path
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `password_env` names an unset variable.
    pub fn to_host(&self) -> ConfigResult<HostConfig> {
        let mut credentials = Credentials::new(&self.username);

        credentials.password = match (&self.password, &self.password_env) {
            (Some(password), _) => Some(SecretString::from(password.expose_secret().to_owned())),
            (None, Some(var)) => {
                let value = std::env::var(var).map_err(|_| {
                    ConfigError::Validation(format!(
                        "server '{}': environment variable {var} is not set",
                        self.name
                    ))
                })?;
                Some(SecretString::from(value))
            }
            (None, None) => None,
        };

        if let Some(key) = &self.key_filename {
            let expanded = shellexpand::full(key).map_or_else(
                |_| PathBuf::from(shellexpand::tilde(key).into_owned()),
                |p| PathBuf::from(p.into_owned()),
            );
            credentials = credentials.with_key_file(expanded);
        }

        Ok(HostConfig::new(&self.name, &self.hostname, credentials)
            .with_port(self.port)
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

/// Whole configuration file: global settings plus the ordered server list
#[derive(Debug, Deserialize)]
pub struct FleetConfig {
    /// Polling and display timing
    #[serde(default)]
    pub monitor: MonitorSettings,
    /// Servers in display order
    pub servers: Vec<ServerEntry>,
}

impl FleetConfig {
    /// Reads and parses `path`; the format follows the extension
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents, format).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!(path = %path.display(), servers = config.servers.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parses `contents` in the given format
    ///
    /// # Errors
    ///
    /// Returns the deserializer's message on failure.
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
        }
    }

    /// Checks the constraints the rest of the system relies on
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending server.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.servers.is_empty() {
            return Err(ConfigError::Validation("no servers configured".into()));
        }

        let mut names = HashSet::new();
        for (idx, server) in self.servers.iter().enumerate() {
            let label = if server.name.trim().is_empty() {
                format!("#{}", idx + 1)
            } else {
                format!("'{}'", server.name)
            };
            let invalid = |what: &str| ConfigError::Validation(format!("server {label}: {what}"));

            if server.name.trim().is_empty() {
                return Err(invalid("name is empty"));
            }
            if !names.insert(server.name.as_str()) {
                return Err(invalid("duplicate name"));
            }
            if server.hostname.trim().is_empty() {
                return Err(invalid("hostname is empty"));
            }
            if server.username.trim().is_empty() {
                return Err(invalid("username is empty"));
            }
            if server.port == 0 {
                return Err(invalid("port must be non-zero"));
            }
            if !(1..=MAX_TIMEOUT_SECS).contains(&server.timeout_secs) {
                return Err(invalid(&format!(
                    "timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
                )));
            }
        }
        Ok(())
    }

    /// Validates and builds the runtime hosts in configuration order
    ///
    /// # Errors
    ///
    /// Returns the first validation or credential resolution error.
    pub fn hosts(&self) -> ConfigResult<Vec<HostConfig>> {
        self.validate()?;
        self.servers.iter().map(ServerEntry::to_host).collect()
    }
}
