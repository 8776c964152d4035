//! Mock construction helpers

use macrokey_rs::error::{MacroError, Result};
use macrokey_rs::input::InputInjector;
use macrokey_rs::session::{ButtonId, KeySymbol};
use macrokey_rs::StatusReporter;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Instant;

/// One call made on a [`RecordingInjector`]
#[derive(Debug, Clone, PartialEq)]
pub enum Injected {
    Move(i32, i32),
    Press(ButtonId),
    Release(ButtonId),
    Scroll(i32, i32),
    KeyDown(KeySymbol),
    KeyUp(KeySymbol),
}

/// Injector that records every call with the instant it happened
#[derive(Default)]
pub struct RecordingInjector {
    calls: Mutex<Vec<(Instant, Injected)>>,
    unknown_keys: Vec<KeySymbol>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys this injector refuses as unrecognized
    pub fn with_unknown_keys(mut self, keys: &[&str]) -> Self {
        self.unknown_keys = keys.iter().map(KeySymbol::new).collect();
        self
    }

    pub fn calls(&self) -> Vec<Injected> {
        self.calls.lock().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Injected)> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: Injected) -> Result<()> {
        self.calls.lock().push((Instant::now(), call));
        Ok(())
    }

    fn check_key(&self, key: &KeySymbol) -> Result<()> {
        if self.unknown_keys.contains(key) {
            return Err(MacroError::UnrecognizedInputSymbol(key.to_string()));
        }
        Ok(())
    }
}

impl InputInjector for RecordingInjector {
    fn move_to(&self, x: i32, y: i32) -> Result<()> {
        self.record(Injected::Move(x, y))
    }

    fn press_button(&self, button: &ButtonId) -> Result<()> {
        self.record(Injected::Press(button.clone()))
    }

    fn release_button(&self, button: &ButtonId) -> Result<()> {
        self.record(Injected::Release(button.clone()))
    }

    fn scroll(&self, dx: i32, dy: i32) -> Result<()> {
        self.record(Injected::Scroll(dx, dy))
    }

    fn press_key(&self, key: &KeySymbol) -> Result<()> {
        self.check_key(key)?;
        self.record(Injected::KeyDown(key.clone()))
    }

    fn release_key(&self, key: &KeySymbol) -> Result<()> {
        self.check_key(key)?;
        self.record(Injected::KeyUp(key.clone()))
    }
}

/// Reporter that keeps every update for later assertions
#[derive(Default)]
pub struct CapturingReporter {
    statuses: Mutex<Vec<String>>,
    speeds: Mutex<Vec<f64>>,
    progress: Mutex<Vec<(usize, usize, Instant)>>,
    hotkeys: Mutex<BTreeMap<String, String>>,
}

impl CapturingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().last().cloned()
    }

    pub fn speeds(&self) -> Vec<f64> {
        self.speeds.lock().clone()
    }

    pub fn progress(&self) -> Vec<(usize, usize, Instant)> {
        self.progress.lock().clone()
    }

    pub fn hotkeys(&self) -> BTreeMap<String, String> {
        self.hotkeys.lock().clone()
    }
}

impl StatusReporter for CapturingReporter {
    fn update_status(&self, status: &str) {
        self.statuses.lock().push(status.to_string());
    }

    fn update_speed(&self, speed: f64) {
        self.speeds.lock().push(speed);
    }

    fn update_progress(&self, current: usize, total: usize) {
        self.progress.lock().push((current, total, Instant::now()));
    }

    fn set_hotkeys(&self, hotkeys: &BTreeMap<String, String>) {
        *self.hotkeys.lock() = hotkeys.clone();
    }
}
