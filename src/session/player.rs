//! Macro player
//!
//! Loads a macro file and replays it on a background thread through an
//! [`InputInjector`]. Speed is shared with the controller through a
//! [`SpeedHandle`] and re-read on every wait, so changes apply to the
//! event currently being waited for.

use rust_i18n::t;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::timing::{CancelToken, PlaybackClock, ProgressThrottle, SpeedHandle, WaitOutcome};
use super::types::{ButtonId, Event, KeySymbol, MacroLog};
use crate::error::{MacroError, Result};
use crate::input::InputInjector;
use crate::status::StatusReporter;

/// Minimum interval between two progress updates
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Replays macro files
pub struct Player {
    reporter: Arc<dyn StatusReporter>,
    injector: Arc<dyn InputInjector>,
    speed: SpeedHandle,
    repeats: u32,
    playing: Arc<AtomicBool>,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
}

impl Player {
    /// Create a player
    pub fn new(
        reporter: Arc<dyn StatusReporter>,
        injector: Arc<dyn InputInjector>,
        speed: SpeedHandle,
    ) -> Self {
        Self {
            reporter,
            injector,
            speed,
            repeats: 0,
            playing: Arc::new(AtomicBool::new(false)),
            cancel: CancelToken::new(),
            worker: None,
        }
    }

    /// Number of passes per playback (0 loops until stopped)
    pub fn with_repeats(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    /// Change the pass count used by the next `start`
    pub fn set_repeats(&mut self, repeats: u32) {
        self.repeats = repeats;
    }

    /// Shared speed handle
    pub fn speed(&self) -> &SpeedHandle {
        &self.speed
    }

    /// Check if a replay is running
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Load `path` and start replaying it in the background
    pub fn start(&mut self, path: &Path) -> Result<()> {
        if self.is_playing() {
            self.reporter.update_status(&t!("prompt.already_playing"));
            return Err(MacroError::AlreadyActive("playing"));
        }
        // A replay that just cleared the flag may still be announcing ready.
        self.join();

        let log = match MacroLog::load(path) {
            Ok(log) => log,
            Err(e) => {
                let status = match e {
                    MacroError::MacroFileMissing(_) => t!("error.macro_missing"),
                    _ => t!("error.macro_invalid"),
                };
                tracing::warn!("Cannot play {:?}: {}", path, e);
                self.reporter.update_status(&status);
                return Err(e);
            }
        };

        if log.is_empty() {
            tracing::info!("Macro {:?} is empty, nothing to play", path);
            self.reporter.update_status(&t!("status.ready"));
            self.reporter.update_progress(0, 0);
            return Ok(());
        }

        tracing::info!(
            events = log.len(),
            duration = log.duration(),
            speed = self.speed.get(),
            repeats = self.repeats,
            "Playback started"
        );

        self.cancel = CancelToken::new();
        self.playing.store(true, Ordering::SeqCst);
        self.reporter.update_status(&t!("status.playing"));
        self.reporter.update_speed(self.speed.get());

        let job = ReplayJob {
            log,
            injector: self.injector.clone(),
            reporter: self.reporter.clone(),
            speed: self.speed.clone(),
            cancel: self.cancel.clone(),
            playing: self.playing.clone(),
            repeats: self.repeats,
        };

        match std::thread::Builder::new()
            .name("macro-replay".to_string())
            .spawn(move || job.run())
        {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.playing.store(false, Ordering::SeqCst);
                self.reporter
                    .update_status(&t!("error.playback", error = e));
                Err(MacroError::Io(e))
            }
        }
    }

    /// Cancel the replay and wait for it to finish.
    ///
    /// No input is injected after this returns. Does nothing if not playing.
    pub fn stop(&mut self) {
        if !self.playing.swap(false, Ordering::SeqCst) {
            // Finished on its own; it announces ready before exiting.
            self.join();
            return;
        }

        self.cancel.cancel();
        self.reporter.update_status(&t!("status.stopping"));
        self.join();
        tracing::info!("Playback stopped");
        self.reporter.update_status(&t!("status.ready"));
        self.reporter.update_progress(0, 0);
    }

    /// Block until the current replay ends on its own or is stopped
    pub fn wait(&mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Replay thread panicked");
                self.playing.store(false, Ordering::SeqCst);
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.join();
    }
}

/// Buttons and keys pressed by the replay and not yet released
#[derive(Debug, Default)]
struct HeldInputs {
    buttons: HashSet<ButtonId>,
    keys: HashSet<KeySymbol>,
}

impl HeldInputs {
    fn release_all(&mut self, injector: &dyn InputInjector) {
        for button in self.buttons.drain() {
            if let Err(e) = injector.release_button(&button) {
                tracing::warn!("Failed to release button {}: {}", button, e);
            }
        }
        for key in self.keys.drain() {
            if let Err(e) = injector.release_key(&key) {
                tracing::warn!("Failed to release key {}: {}", key, e);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayEnd {
    Completed,
    Cancelled,
}

/// Everything the replay thread owns
struct ReplayJob {
    log: MacroLog,
    injector: Arc<dyn InputInjector>,
    reporter: Arc<dyn StatusReporter>,
    speed: SpeedHandle,
    cancel: CancelToken,
    playing: Arc<AtomicBool>,
    repeats: u32,
}

impl ReplayJob {
    fn run(self) {
        let mut held = HeldInputs::default();
        let end = self.run_passes(&mut held);
        held.release_all(self.injector.as_ref());

        // Whoever clears the flag first announces the transition.
        if end == ReplayEnd::Completed && self.playing.swap(false, Ordering::SeqCst) {
            tracing::info!("Playback finished");
            self.reporter.update_status(&t!("status.ready"));
            self.reporter.update_progress(0, 0);
        }
    }

    fn run_passes(&self, held: &mut HeldInputs) -> ReplayEnd {
        let total = self.log.len();
        let zero = self.log.start_time();
        let mut throttle = ProgressThrottle::new(PROGRESS_INTERVAL);
        let mut pass: u32 = 0;

        loop {
            if self.repeats > 0 && pass >= self.repeats {
                return ReplayEnd::Completed;
            }
            if self.cancel.is_cancelled() {
                return ReplayEnd::Cancelled;
            }
            pass += 1;

            if self.repeats > 1 {
                let total_passes = self.repeats;
                tracing::info!(pass, repeats = total_passes, "Starting pass");
                self.reporter.update_status(&format!(
                    "{} ({})",
                    t!("status.playing"),
                    t!("status.loop", current = pass, total = total_passes)
                ));
            }

            let mut clock = PlaybackClock::start(self.speed.get());
            for (index, event) in self.log.events().iter().enumerate() {
                let target = event.time() - zero;
                if clock.wait_until(target, &self.speed, &self.cancel) == WaitOutcome::Cancelled {
                    return ReplayEnd::Cancelled;
                }

                self.dispatch(event, held);

                if throttle.ready(Instant::now()) {
                    self.reporter.update_progress(index + 1, total);
                }
            }
        }
    }

    fn dispatch(&self, event: &Event, held: &mut HeldInputs) {
        let injector = self.injector.as_ref();
        let result = match event {
            Event::Move { x, y, .. } => injector.move_to(*x, *y),
            Event::Click {
                x,
                y,
                button,
                pressed,
                ..
            } => injector.move_to(*x, *y).and_then(|()| {
                if *pressed {
                    injector.press_button(button)?;
                    held.buttons.insert(button.clone());
                } else {
                    held.buttons.remove(button);
                    injector.release_button(button)?;
                }
                Ok(())
            }),
            Event::Scroll { dx, dy, .. } => injector.scroll(*dx, *dy),
            Event::KeyPress { key, .. } => injector.press_key(key).map(|()| {
                held.keys.insert(key.clone());
            }),
            Event::KeyRelease { key, .. } => {
                held.keys.remove(key);
                injector.release_key(key)
            }
        };

        match result {
            Ok(()) => {}
            Err(MacroError::UnrecognizedInputSymbol(symbol)) => {
                tracing::warn!(
                    "Skipping {} event with unrecognized symbol {:?}",
                    event.kind_name(),
                    symbol
                );
            }
            Err(e) => {
                tracing::warn!("Failed to replay {} event: {}", event.kind_name(), e);
            }
        }
    }
}
