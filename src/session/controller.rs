//! Session controller
//!
//! Owns the recorder and the player and arbitrates between them: recording
//! and playback never overlap, and a request for one while the other is
//! active is refused with a prompt instead of being queued.

use rust_i18n::t;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::player::Player;
use super::recorder::Recorder;
use super::timing::{SpeedHandle, MIN_SPEED};
use super::types::SessionState;
use crate::config::HotkeyAction;
use crate::error::{MacroError, Result};
use crate::i18n;
use crate::status::StatusReporter;

/// Speed change per hotkey press
pub const SPEED_STEP: f64 = 0.5;

/// Minimum time between two accepted speed changes
pub const SPEED_DEBOUNCE: Duration = Duration::from_millis(200);

/// Speed after one speed-up step; anything below one step snaps to it
pub fn next_speed_up(current: f64) -> f64 {
    if current < SPEED_STEP {
        SPEED_STEP
    } else {
        current + SPEED_STEP
    }
}

/// Speed after one slow-down step, never below [`MIN_SPEED`]
pub fn next_speed_down(current: f64) -> f64 {
    (current - SPEED_STEP).max(MIN_SPEED)
}

/// Debounced stepping of a shared [`SpeedHandle`]
#[derive(Debug, Clone)]
pub struct SpeedControl {
    speed: SpeedHandle,
    debounce: Duration,
    last_change: Option<Instant>,
}

impl SpeedControl {
    /// Control `speed` with the default debounce window
    pub fn new(speed: SpeedHandle) -> Self {
        Self {
            speed,
            debounce: SPEED_DEBOUNCE,
            last_change: None,
        }
    }

    /// Override the debounce window
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Current speed
    pub fn get(&self) -> f64 {
        self.speed.get()
    }

    /// Step up now; `None` if debounced
    pub fn speed_up(&mut self) -> Option<f64> {
        self.speed_up_at(Instant::now())
    }

    /// Step down now; `None` if debounced
    pub fn speed_down(&mut self) -> Option<f64> {
        self.speed_down_at(Instant::now())
    }

    /// Step up as if called at `now`
    pub fn speed_up_at(&mut self, now: Instant) -> Option<f64> {
        self.step(now, next_speed_up)
    }

    /// Step down as if called at `now`
    pub fn speed_down_at(&mut self, now: Instant) -> Option<f64> {
        self.step(now, next_speed_down)
    }

    fn step(&mut self, now: Instant, next: fn(f64) -> f64) -> Option<f64> {
        if let Some(last) = self.last_change {
            if now.saturating_duration_since(last) < self.debounce {
                return None;
            }
        }
        self.last_change = Some(now);
        Some(self.speed.set(next(self.speed.get())))
    }
}

/// State machine over one recorder and one player
pub struct SessionController {
    recorder: Recorder,
    player: Player,
    reporter: Arc<dyn StatusReporter>,
    speed: SpeedControl,
    state: SessionState,
    hotkeys: BTreeMap<String, String>,
    last_saved: Option<PathBuf>,
}

impl SessionController {
    /// Create a controller; speed steps act on the player's speed handle
    pub fn new(recorder: Recorder, player: Player, reporter: Arc<dyn StatusReporter>) -> Self {
        let speed = SpeedControl::new(player.speed().clone());
        Self {
            recorder,
            player,
            reporter,
            speed,
            state: SessionState::Idle,
            hotkeys: BTreeMap::new(),
            last_saved: None,
        }
    }

    /// Hotkey map shown by the status display
    pub fn set_hotkeys(&mut self, hotkeys: BTreeMap<String, String>) {
        self.hotkeys = hotkeys;
        self.reporter.set_hotkeys(&self.hotkeys);
    }

    /// Current state; a replay that ended on its own reads as idle
    pub fn state(&mut self) -> SessionState {
        if self.state == SessionState::Playing && !self.player.is_playing() {
            self.state = SessionState::Idle;
        }
        self.state
    }

    /// Current playback speed
    pub fn speed(&self) -> f64 {
        self.speed.get()
    }

    /// Macro file played next: the last save, which may have landed in the
    /// fallback directory, or else the configured file
    pub fn macro_path(&self) -> PathBuf {
        self.last_saved
            .clone()
            .unwrap_or_else(|| self.recorder.path().to_path_buf())
    }

    /// Push the full display state to the reporter
    pub fn announce(&mut self) {
        let status = match self.state() {
            SessionState::Recording => t!("status.recording"),
            SessionState::Playing => t!("status.playing"),
            SessionState::StoppingRecording => t!("status.saving"),
            SessionState::StoppingPlaying => t!("status.stopping"),
            SessionState::Idle => t!("status.ready"),
        };
        self.reporter.set_hotkeys(&self.hotkeys);
        self.reporter.update_speed(self.speed.get());
        self.reporter.update_status(&status);
    }

    /// Run the action bound to a hotkey.
    ///
    /// Refusals and failures have already been shown to the user, so they
    /// are only logged here.
    pub fn handle(&mut self, action: HotkeyAction) {
        tracing::debug!(?action, state = %self.state, "Hotkey");
        let result = match action {
            HotkeyAction::ToggleRecord => self.toggle_record(),
            HotkeyAction::TogglePlay => self.toggle_play(),
            HotkeyAction::SpeedUp => {
                self.speed_up();
                Ok(())
            }
            HotkeyAction::SpeedDown => {
                self.speed_down();
                Ok(())
            }
            HotkeyAction::ToggleLanguage => {
                self.toggle_language();
                Ok(())
            }
        };

        match result {
            Err(e) if e.is_fatal() => tracing::error!("{:?} failed: {}", action, e),
            Err(e) => tracing::debug!("{:?} refused: {}", action, e),
            Ok(()) => {}
        }
    }

    /// Start recording, or stop and save if already recording
    pub fn toggle_record(&mut self) -> Result<()> {
        if self.state().is_recording() {
            self.stop_recording().map(|_| ())
        } else {
            self.start_recording()
        }
    }

    /// Start playback, or stop it if already playing
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.state().is_playing() {
            self.stop_playing();
            Ok(())
        } else {
            self.start_playing()
        }
    }

    /// Start recording unless playback is active
    pub fn start_recording(&mut self) -> Result<()> {
        let active = self.state();
        if active.is_playing() {
            self.reporter.update_status(&t!("prompt.stop_play_first"));
            return Err(MacroError::ModeConflict {
                active,
                requested: SessionState::Recording,
            });
        }

        self.recorder.start()?;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Stop recording and save; returns the path written
    pub fn stop_recording(&mut self) -> Result<Option<PathBuf>> {
        if !self.state().is_recording() {
            return Ok(None);
        }

        self.state = SessionState::StoppingRecording;
        let result = self.recorder.stop();
        self.state = SessionState::Idle;
        if let Ok(Some(path)) = &result {
            self.last_saved = Some(path.clone());
        }
        result
    }

    /// Start playback unless recording is active
    pub fn start_playing(&mut self) -> Result<()> {
        let active = self.state();
        if active.is_recording() {
            self.reporter.update_status(&t!("prompt.stop_record_first"));
            return Err(MacroError::ModeConflict {
                active,
                requested: SessionState::Playing,
            });
        }

        let path = self.macro_path();
        self.player.start(&path)?;
        self.state = if self.player.is_playing() {
            SessionState::Playing
        } else {
            SessionState::Idle
        };
        Ok(())
    }

    /// Stop playback and wait for the replay thread to exit
    pub fn stop_playing(&mut self) {
        if !self.state().is_playing() {
            self.player.stop();
            return;
        }

        self.state = SessionState::StoppingPlaying;
        self.player.stop();
        self.state = SessionState::Idle;
    }

    /// Block until a running replay finishes
    pub fn wait_for_playback(&mut self) {
        self.player.wait();
        self.state();
    }

    /// One speed step up; `None` if debounced
    pub fn speed_up(&mut self) -> Option<f64> {
        let speed = self.speed.speed_up()?;
        self.on_speed_changed(speed);
        Some(speed)
    }

    /// One speed step down; `None` if debounced
    pub fn speed_down(&mut self) -> Option<f64> {
        let speed = self.speed.speed_down()?;
        self.on_speed_changed(speed);
        Some(speed)
    }

    fn on_speed_changed(&self, speed: f64) {
        tracing::info!(speed, "Playback speed changed");
        self.reporter.update_speed(speed);
    }

    /// Switch to the next display language and redraw everything
    pub fn toggle_language(&mut self) {
        let language = i18n::current_language().next();
        i18n::set_language(language);
        tracing::info!("Language switched to {}", language.display_name());
        self.announce();
    }

    /// Stop whatever is running; a recording in progress is saved
    pub fn shutdown(&mut self) {
        if let Err(e) = self.stop_recording() {
            tracing::error!("Failed to save recording on shutdown: {}", e);
        }
        self.stop_playing();
    }
}
