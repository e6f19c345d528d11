//! Command handler modules for the CLI.

mod completions;
mod list;
mod once;
mod validate;
mod watch;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(config_path: Option<&Path>, command: Commands, color: bool) -> Result<(), CliError> {
    match command {
        Commands::Watch {
            poll_interval,
            refresh_ms,
        } => watch::cmd_watch(
            config_path,
            watch::WatchOverrides {
                poll_interval_secs: poll_interval,
                display_interval_ms: refresh_ms,
            },
            color,
        ),
        Commands::Once { format } => once::cmd_once(config_path, format, color),
        Commands::List { format } => list::cmd_list(config_path, format),
        Commands::Validate => validate::cmd_validate(config_path),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
