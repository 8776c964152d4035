//! Macro recorder
//!
//! Subscribes to the input hub while recording and appends converted events
//! to an in-memory [`MacroLog`]. The hub callback runs on the OS hook thread,
//! so it only takes a short lock and pushes one event.

use parking_lot::Mutex;
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::types::{Event, KeySymbol, MacroLog, MacroMetadata};
use crate::config;
use crate::error::{MacroError, Result};
use crate::input::{InputHub, InputKind, InputNotification, SubscriptionId};
use crate::status::StatusReporter;

/// Log being built plus the bookkeeping needed to timestamp and sample it
#[derive(Debug)]
struct Capture {
    start: Instant,
    last_time: f64,
    last_move: Option<Instant>,
    log: MacroLog,
}

impl Capture {
    fn new(start: Instant) -> Self {
        Self {
            start,
            last_time: 0.0,
            last_move: None,
            log: MacroLog::new(),
        }
    }

    /// Seconds since start, never earlier than the previous event
    fn elapsed(&mut self, at: Instant) -> f64 {
        let time = at
            .saturating_duration_since(self.start)
            .as_secs_f64()
            .max(self.last_time);
        self.last_time = time;
        time
    }
}

/// Turns notifications into events for one capture
struct CaptureFilter {
    capture: Arc<Mutex<Capture>>,
    sample_interval: Duration,
    excluded_key: Option<KeySymbol>,
}

impl CaptureFilter {
    fn handle(&self, notification: &InputNotification) {
        let mut capture = self.capture.lock();
        let at = notification.at;

        let event = match &notification.kind {
            InputKind::PointerMoved { x, y } => {
                if let Some(last) = capture.last_move {
                    if at.saturating_duration_since(last) < self.sample_interval {
                        return;
                    }
                }
                capture.last_move = Some(at);
                Event::Move {
                    time: capture.elapsed(at),
                    x: *x,
                    y: *y,
                }
            }
            InputKind::Button {
                x,
                y,
                button,
                pressed,
            } => Event::Click {
                time: capture.elapsed(at),
                x: *x,
                y: *y,
                button: button.clone(),
                pressed: *pressed,
            },
            InputKind::Scroll { x, y, dx, dy } => Event::Scroll {
                time: capture.elapsed(at),
                x: *x,
                y: *y,
                dx: *dx,
                dy: *dy,
            },
            InputKind::Key { key, pressed } => {
                if self.excluded_key.as_ref() == Some(key) {
                    return;
                }
                let time = capture.elapsed(at);
                if *pressed {
                    Event::KeyPress {
                        time,
                        key: key.clone(),
                    }
                } else {
                    Event::KeyRelease {
                        time,
                        key: key.clone(),
                    }
                }
            }
        };

        capture.log.push(event);
    }
}

/// Records input from an [`InputHub`] into a macro file
pub struct Recorder {
    hub: Arc<InputHub>,
    reporter: Arc<dyn StatusReporter>,
    capture: Arc<Mutex<Capture>>,
    subscription: Option<SubscriptionId>,
    sample_interval: Duration,
    excluded_key: Option<KeySymbol>,
    path: PathBuf,
    fallback_dir: Option<PathBuf>,
}

impl Recorder {
    /// Create a recorder saving to `path`
    pub fn new(
        hub: Arc<InputHub>,
        reporter: Arc<dyn StatusReporter>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            hub,
            reporter,
            capture: Arc::new(Mutex::new(Capture::new(Instant::now()))),
            subscription: None,
            sample_interval: Duration::from_secs_f64(config::DEFAULT_SAMPLE_RATE),
            excluded_key: None,
            path: path.into(),
            fallback_dir: config::program_dir(),
        }
    }

    /// Minimum interval between two recorded pointer moves
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Key that is never recorded (the record hotkey)
    pub fn with_excluded_key(mut self, key: Option<KeySymbol>) -> Self {
        self.excluded_key = key;
        self
    }

    /// Directory tried when saving to the primary path fails
    pub fn with_fallback_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.fallback_dir = dir;
        self
    }

    /// Primary output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.subscription.is_some()
    }

    /// Number of events captured so far
    pub fn event_count(&self) -> usize {
        self.capture.lock().log.len()
    }

    /// Start a new capture, discarding any previous one
    pub fn start(&mut self) -> Result<()> {
        if self.is_recording() {
            self.reporter.update_status(&t!("prompt.already_recording"));
            return Err(MacroError::AlreadyActive("recording"));
        }

        *self.capture.lock() = Capture::new(Instant::now());

        let filter = CaptureFilter {
            capture: self.capture.clone(),
            sample_interval: self.sample_interval,
            excluded_key: self.excluded_key.clone(),
        };
        self.subscription = Some(
            self.hub
                .subscribe(Arc::new(move |n: &InputNotification| filter.handle(n))),
        );

        tracing::info!("Recording started");
        self.reporter.update_status(&t!("status.recording"));
        Ok(())
    }

    /// Stop capturing and save the log.
    ///
    /// Returns the path actually written, or `None` if not recording.
    pub fn stop(&mut self) -> Result<Option<PathBuf>> {
        let Some(subscription) = self.subscription.take() else {
            return Ok(None);
        };

        // No callback is running or will run once this returns.
        self.hub.unsubscribe(subscription);

        self.reporter.update_status(&t!("status.saving"));
        let log = std::mem::take(&mut self.capture.lock().log);
        let metadata = MacroMetadata::describe(&log, self.sample_interval.as_secs_f64());
        tracing::info!(
            events = log.len(),
            duration = log.duration(),
            "Recording stopped"
        );

        match self.persist(&log, &metadata) {
            Ok(path) => {
                tracing::info!("{}", t!("status.saved", filename = path.display()));
                self.reporter.update_status(&t!("status.ready"));
                Ok(Some(path))
            }
            Err(e) => {
                tracing::error!("Failed to save macro: {}", e);
                self.reporter
                    .update_status(&t!("status.save_failed", error = e));
                Err(e)
            }
        }
    }

    fn persist(&self, log: &MacroLog, metadata: &MacroMetadata) -> Result<PathBuf> {
        let primary_error = match log.save_atomic(&self.path, metadata) {
            Ok(()) => return Ok(self.path.clone()),
            Err(e) => e,
        };
        tracing::warn!("Failed to save macro to {:?}: {}", self.path, primary_error);

        let fallback = self
            .fallback_dir
            .as_ref()
            .zip(self.path.file_name())
            .map(|(dir, name)| dir.join(name))
            .filter(|candidate| *candidate != self.path);

        let Some(fallback) = fallback else {
            return Err(MacroError::PersistenceFailure {
                path: self.path.clone(),
                fallback: None,
                message: primary_error.to_string(),
            });
        };

        match log.save_atomic(&fallback, metadata) {
            Ok(()) => {
                tracing::warn!("Saved macro to fallback location {:?}", fallback);
                Ok(fallback)
            }
            Err(fallback_error) => Err(MacroError::PersistenceFailure {
                path: self.path.clone(),
                fallback: Some(fallback),
                message: format!("{}; fallback: {}", primary_error, fallback_error),
            }),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.hub.unsubscribe(subscription);
        }
    }
}
