//! Full-screen terminal renderer for the watch command.

use std::io::{self, Write};

use fleetwatch_core::{Frame, Renderer};

use crate::format::format_frame;

/// Clear screen and move the cursor home
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Redraws the whole table on stdout for every frame
pub struct TerminalRenderer {
    color: bool,
    write_failed: bool,
}

impl TerminalRenderer {
    /// Creates a renderer; `color` enables ANSI row colors
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self {
            color,
            write_failed: false,
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, frame: &Frame) {
        let text = format_frame(frame, self.color);
        let mut stdout = io::stdout().lock();
        let result = write!(stdout, "{CLEAR_SCREEN}{text}").and_then(|()| stdout.flush());

        // Log only the first failure; a closed terminal fails every frame
        match result {
            Err(err) if !self.write_failed => {
                self.write_failed = true;
                tracing::warn!(error = %err, "Failed to draw frame");
            }
            Ok(()) => self.write_failed = false,
            Err(_) => {}
        }
    }
}
