//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Live CPU, memory and disk usage for a fleet of SSH hosts
#[derive(Parser)]
#[command(name = "fleetwatch")]
#[command(author, version, about = "Monitor CPU, memory and disk usage across SSH hosts")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (.json, .toml, .yaml)
    #[arg(short, long, global = true, env = "FLEETWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write logs to this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter directives, e.g. `fleetwatch_core=debug` (overrides -v/-q)
    #[arg(long, global = true, env = "RUST_LOG", value_name = "DIRECTIVES")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the live table until interrupted (default)
    #[command(about = "Continuously refresh the status table")]
    Watch {
        /// Seconds between healthy polls of each host
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u32>,

        /// Milliseconds between table refreshes
        #[arg(long, value_name = "MS")]
        refresh_ms: Option<u64>,
    },

    /// Poll every host once and print the result
    #[command(about = "Poll every host once, print one table and exit")]
    Once {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// List configured hosts
    #[command(about = "List the hosts in the configuration")]
    List {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Check the configuration file
    #[command(about = "Load and validate the configuration file")]
    Validate,

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Watch {
            poll_interval: None,
            refresh_ms: None,
        }
    }
}

/// Output format for list and once
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    #[default]
    Table,
    /// Output as JSON
    Json,
}
