//! Table formatting for frames and host listings.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Local;
use fleetwatch_core::{DisplayRow, Frame, HostConfig, RowState};

const CPU_WIDTH: usize = 7;
const MEMORY_WIDTH: usize = 13;
const DISK_WIDTH: usize = 15;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Formats one frame as the status table.
///
/// The first column is at least 12 wide.
#[must_use]
pub fn format_frame(frame: &Frame, color: bool) -> String {
    let name_width = frame
        .rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max(12);
    let rule = name_width + CPU_WIDTH + MEMORY_WIDTH + DISK_WIDTH + 6 + "Status".len();

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<name_width$} {:<CPU_WIDTH$} {:<MEMORY_WIDTH$} {:<DISK_WIDTH$} Status",
        "Server", "CPU", "Memory", "Disk"
    );
    let _ = writeln!(
        output,
        "{:<name_width$} {:<CPU_WIDTH$} {:<MEMORY_WIDTH$} {:<DISK_WIDTH$}",
        "", "Usage", "Used/Total", "Used/Total"
    );
    let _ = writeln!(output, "{:-<rule$}", "");
    let _ = writeln!(
        output,
        "Last Update: {}\n",
        frame
            .taken_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );

    for row in &frame.rows {
        let line = format_row(row, name_width);
        if color {
            let _ = writeln!(output, "{}{line}{RESET}", row_color(row.state));
        } else {
            let _ = writeln!(output, "{line}");
        }
    }

    output
}

fn format_row(row: &DisplayRow, name_width: usize) -> String {
    format!(
        "{:<name_width$} {:<CPU_WIDTH$} {:<MEMORY_WIDTH$} {:<DISK_WIDTH$} {}",
        row.name, row.cpu, row.memory, row.disk, row.status
    )
}

const fn row_color(state: RowState) -> &'static str {
    match state {
        RowState::Healthy => GREEN,
        RowState::Connecting => YELLOW,
        RowState::Failed => RED,
    }
}

/// Formats configured hosts as a table
#[must_use]
pub fn format_hosts_table(hosts: &[Arc<HostConfig>]) -> String {
    if hosts.is_empty() {
        return "No hosts configured.".to_string();
    }

    let name_width = hosts.iter().map(|h| h.name.len()).max().unwrap_or(4).max(4);
    let host_width = hosts
        .iter()
        .map(|h| h.hostname.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let user_width = hosts
        .iter()
        .map(|h| h.credentials.username.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let port_width = 5;
    let auth_width = 8;

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<user_width$}  {:<auth_width$}  TIMEOUT",
        "NAME", "HOST", "PORT", "USER", "AUTH"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<host_width$}  {:-<port_width$}  {:-<user_width$}  {:-<auth_width$}  -------",
        "", "", "", "", ""
    );
    for host in hosts {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<user_width$}  {:<auth_width$}  {}s",
            host.name,
            host.hostname,
            host.port,
            host.credentials.username,
            host.credentials.auth_method(),
            host.timeout.as_secs()
        );
    }

    output.trim_end().to_string()
}
