//! Replay clock
//!
//! Maps recorded timestamps onto the monotonic clock, scaled by a speed that
//! may change while a replay is in progress. Waits are chunked so a
//! cancellation request is noticed within [`CANCEL_POLL_INTERVAL`].
//!
//! A speed change re-baselines the clock: the recorded position reached so
//! far is kept, and only the remaining distance is scaled by the new speed.
//! This avoids jumps when the speed changes mid-pass.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep inside a wait
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Smallest allowed playback speed
pub const MIN_SPEED: f64 = 0.1;

/// Cooperative cancellation flag shared between a controller and a worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Playback speed readable from the replay thread while the controller writes it
#[derive(Debug, Clone)]
pub struct SpeedHandle(Arc<AtomicU64>);

impl SpeedHandle {
    /// Create a handle holding `speed` (floored at [`MIN_SPEED`])
    pub fn new(speed: f64) -> Self {
        Self(Arc::new(AtomicU64::new(clamp_speed(speed).to_bits())))
    }

    /// Current speed
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }

    /// Replace the speed, returning the value actually stored
    pub fn set(&self, speed: f64) -> f64 {
        let speed = clamp_speed(speed);
        self.0.store(speed.to_bits(), Ordering::SeqCst);
        speed
    }
}

impl Default for SpeedHandle {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Floor at [`MIN_SPEED`]; non-finite input falls back to 1.0
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.max(MIN_SPEED)
    } else {
        1.0
    }
}

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The target time was reached
    Elapsed,
    /// Cancellation was requested first
    Cancelled,
}

/// Clock for one replay pass
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    /// Real instant of the last baseline
    origin: Instant,
    /// Recorded seconds already covered at `origin`
    base: f64,
    /// Speed in effect since `origin`
    speed: f64,
}

impl PlaybackClock {
    /// Start a pass now
    pub fn start(speed: f64) -> Self {
        Self::start_at(Instant::now(), speed)
    }

    /// Start a pass at a given instant
    pub fn start_at(origin: Instant, speed: f64) -> Self {
        Self {
            origin,
            base: 0.0,
            speed: clamp_speed(speed),
        }
    }

    /// Speed currently in effect
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Recorded seconds covered at `now`
    pub fn position(&self, now: Instant) -> f64 {
        self.base + now.saturating_duration_since(self.origin).as_secs_f64() * self.speed
    }

    /// Switch speed at `now`, keeping the recorded position continuous
    pub fn set_speed(&mut self, speed: f64, now: Instant) {
        let speed = clamp_speed(speed);
        if speed == self.speed {
            return;
        }
        self.base = self.position(now);
        self.origin = now;
        self.speed = speed;
    }

    /// Real instant at which the recorded offset `target` is reached
    pub fn deadline(&self, target: f64) -> Instant {
        let remaining = ((target - self.base) / self.speed).max(0.0);
        self.origin + Duration::from_secs_f64(remaining)
    }

    /// Block until the recorded offset `target` is reached or `cancel` fires.
    ///
    /// `speed` is re-read on every poll, so a change applies to the wait in
    /// progress.
    pub fn wait_until(
        &mut self,
        target: f64,
        speed: &SpeedHandle,
        cancel: &CancelToken,
    ) -> WaitOutcome {
        loop {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }

            let now = Instant::now();
            self.set_speed(speed.get(), now);

            let deadline = self.deadline(target);
            if deadline <= now {
                return WaitOutcome::Elapsed;
            }

            std::thread::sleep((deadline - now).min(CANCEL_POLL_INTERVAL));
        }
    }
}

/// Rate limiter for progress updates
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    /// Allow at most one update per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true (and records `now`) if an update may be sent
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
