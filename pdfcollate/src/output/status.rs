//! Single-line status display.
//!
//! Only the most recent status matters, so updates overwrite one terminal
//! line in place and are rate limited. Nothing is drawn when stdout is not a
//! terminal.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default minimum time between redraws.
const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct StatusState {
    current: Option<String>,
    last_draw: Option<Instant>,
    visible: bool,
}

/// Overwritable status line.
#[derive(Debug)]
pub struct StatusLine {
    enabled: bool,
    update_interval: Duration,
    state: Mutex<StatusState>,
}

impl StatusLine {
    /// Create a status line that draws only on a terminal.
    pub fn new() -> Self {
        Self::with_enabled(Self::is_terminal())
    }

    /// Create a status line that never draws.
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            update_interval: UPDATE_INTERVAL,
            state: Mutex::new(StatusState::default()),
        }
    }

    /// Check if stdout is a terminal.
    fn is_terminal() -> bool {
        use std::io::IsTerminal;
        io::stdout().is_terminal()
    }

    /// Whether the line draws to the terminal.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Most recent status message.
    pub fn current(&self) -> Option<String> {
        self.state.lock().ok().and_then(|state| state.current.clone())
    }

    /// Replace the status message, redrawing if the rate limit allows.
    pub fn set(&self, message: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.current = Some(message.to_string());

        if !self.enabled {
            return;
        }
        if state
            .last_draw
            .is_some_and(|last| last.elapsed() < self.update_interval)
        {
            return;
        }

        state.last_draw = Some(Instant::now());
        state.visible = true;
        print!("\r\x1b[K{message}");
        io::stdout().flush().ok();
    }

    /// Erase the line so regular output can follow.
    pub fn clear(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if self.enabled && state.visible {
            print!("\r\x1b[K");
            io::stdout().flush().ok();
            state.visible = false;
        }
    }

    /// Erase the line and forget the message.
    pub fn reset(&self) {
        self.clear();
        if let Ok(mut state) = self.state.lock() {
            state.current = None;
            state.last_draw = None;
        }
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}
