//! Test data builders for creating test objects

use macrokey_rs::session::{ButtonId, Event, KeySymbol, MacroLog, MacroMetadata};
use std::path::{Path, PathBuf};

/// Builder for macro logs with increasing timestamps
pub struct MacroLogBuilder {
    events: Vec<Event>,
}

impl MacroLogBuilder {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn move_to(mut self, time: f64, x: i32, y: i32) -> Self {
        self.events.push(Event::Move { time, x, y });
        self
    }

    pub fn click(mut self, time: f64, x: i32, y: i32, button: &str, pressed: bool) -> Self {
        self.events.push(Event::Click {
            time,
            x,
            y,
            button: ButtonId::new(button),
            pressed,
        });
        self
    }

    pub fn scroll(mut self, time: f64, dx: i32, dy: i32) -> Self {
        self.events.push(Event::Scroll {
            time,
            x: 0,
            y: 0,
            dx,
            dy,
        });
        self
    }

    pub fn key_press(mut self, time: f64, key: &str) -> Self {
        self.events.push(Event::KeyPress {
            time,
            key: KeySymbol::new(key),
        });
        self
    }

    pub fn key_release(mut self, time: f64, key: &str) -> Self {
        self.events.push(Event::KeyRelease {
            time,
            key: KeySymbol::new(key),
        });
        self
    }

    pub fn build(self) -> MacroLog {
        MacroLog::from_events(self.events).expect("builder events must be sorted")
    }

    /// Save the log into `dir` and return its path
    pub fn save_in(self, dir: &Path) -> PathBuf {
        let path = dir.join("macro.json");
        let log = self.build();
        log.save_atomic(&path, &MacroMetadata::describe(&log, 0.016))
            .expect("failed to save test macro");
        path
    }
}

impl Default for MacroLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_log_builder() {
        let log = MacroLogBuilder::new()
            .move_to(0.0, 1, 1)
            .click(0.5, 1, 1, "left", true)
            .build();

        assert_eq!(log.len(), 2);
        assert_eq!(log.duration(), 0.5);
    }
}
