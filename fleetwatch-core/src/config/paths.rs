//! Default file locations

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "FLEETWATCH_CONFIG";

/// Single-file layout looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "config.json";

const APP_DIR: &str = "fleetwatch";

/// `<config_dir>/fleetwatch/config.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// `<state_dir or cache_dir>/fleetwatch/fleetwatch.log`
#[must_use]
pub fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join(APP_DIR).join("fleetwatch.log"))
}

/// Picks the config file: explicit path, then `FLEETWATCH_CONFIG`, then
/// `./config.json` if present, then [`default_config_path`].
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_default();
    resolve_config_path_in(explicit, std::env::var_os(CONFIG_ENV), &cwd)
}

/// [`resolve_config_path`] with the environment and working directory supplied
#[must_use]
pub fn resolve_config_path_in(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    cwd: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    default_config_path()
}
