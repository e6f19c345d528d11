//! `fleetwatch` - live CPU, memory and disk usage across SSH hosts
//!
//! Provides commands for watching the live table, polling once, listing
//! and validating the configured hosts, and generating shell completions.

mod cli;
mod commands;
mod error;
mod format;
mod render;
mod util;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let command = cli.command.unwrap_or_default();
    let color = !cli.no_color;

    let owns_terminal = matches!(command, Commands::Watch { .. });
    let tracing_config = util::tracing_config(
        cli.verbose,
        cli.quiet,
        color,
        cli.log_file.as_deref(),
        cli.log_filter.as_deref(),
        owns_terminal,
    );
    if let Err(e) = fleetwatch_core::init_tracing(&tracing_config)
        && !cli.quiet
    {
        eprintln!("Warning: logging disabled: {e}");
    }

    let result = commands::dispatch(config_path, command, color);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
