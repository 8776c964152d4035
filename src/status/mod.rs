//! Status reporting
//!
//! The session controller, recorder and player describe what they are doing
//! through a [`StatusReporter`]. Two implementations ship with the crate:
//!
//! - [`TerminalPanel`] - Boxed status panel redrawn in place with crossterm
//! - [`TracingReporter`] - Plain structured log lines, for headless runs

pub mod terminal;

pub use terminal::{PanelTheme, TerminalPanel};

use std::collections::BTreeMap;

/// Receives user-visible status updates.
///
/// Implementations are called from the hotkey-dispatch thread and the
/// replay thread, so they must be cheap and must not call back into the
/// session.
pub trait StatusReporter: Send + Sync {
    /// Current status line (already translated)
    fn update_status(&self, status: &str);

    /// Current playback speed multiplier
    fn update_speed(&self, speed: f64);

    /// Replay progress; `(0, 0)` clears it
    fn update_progress(&self, current: usize, total: usize);

    /// Hotkey map, action name to key name
    fn set_hotkeys(&self, hotkeys: &BTreeMap<String, String>);
}

/// Reporter that writes every update to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn update_status(&self, status: &str) {
        tracing::info!(target: "macrokey_rs::status", %status, "Status");
    }

    fn update_speed(&self, speed: f64) {
        tracing::info!(target: "macrokey_rs::status", speed, "Speed");
    }

    fn update_progress(&self, current: usize, total: usize) {
        tracing::debug!(target: "macrokey_rs::status", current, total, "Progress");
    }

    fn set_hotkeys(&self, hotkeys: &BTreeMap<String, String>) {
        for (action, key) in hotkeys {
            tracing::info!(target: "macrokey_rs::status", %action, %key, "Hotkey");
        }
    }
}
