//! Input hook and injection layer
//!
//! The OS hook delivers raw notifications on its own thread. They are
//! converted to host-independent [`InputNotification`]s and fanned out by an
//! [`InputHub`] to whoever is subscribed (the recorder while capturing, the
//! hotkey listener always). Replay goes the other way, through an
//! [`InputInjector`].
//!
//! # Components
//!
//! - [`InputHub`] - Subscription registry and dispatcher
//! - [`InputInjector`] - Synthesizes pointer and keyboard events
//! - [`HotkeyListener`] - Turns bound key presses into [`HotkeyAction`]s
//! - [`RdevHook`] / [`RdevInjector`] - `rdev`-based host backend
//!
//! [`HotkeyAction`]: crate::config::HotkeyAction

pub mod hotkeys;
pub mod rdev_backend;

pub use hotkeys::HotkeyListener;
pub use rdev_backend::{RdevHook, RdevInjector};

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::session::types::{ButtonId, KeySymbol};

/// What happened on the input device
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    /// Pointer moved to an absolute position
    PointerMoved { x: i32, y: i32 },
    /// Pointer button changed state at a position
    Button {
        x: i32,
        y: i32,
        button: ButtonId,
        pressed: bool,
    },
    /// Wheel scrolled at a position
    Scroll { x: i32, y: i32, dx: i32, dy: i32 },
    /// Key changed state
    Key { key: KeySymbol, pressed: bool },
}

/// A raw input notification stamped with its arrival time
#[derive(Debug, Clone, PartialEq)]
pub struct InputNotification {
    /// Monotonic arrival time
    pub at: Instant,
    /// Payload
    pub kind: InputKind,
}

impl InputNotification {
    /// Stamp a notification with the current instant
    pub fn now(kind: InputKind) -> Self {
        Self {
            at: Instant::now(),
            kind,
        }
    }
}

/// Callback invoked on the hook thread for each notification
pub type InputHandler = Arc<dyn Fn(&InputNotification) + Send + Sync>;

/// Identifies a subscription for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out point between the OS hook and its subscribers.
///
/// Handlers run while the registry lock is held. Once [`unsubscribe`]
/// returns, the removed handler is not running and will not run again.
/// Handlers must not subscribe or unsubscribe from inside a callback.
///
/// [`unsubscribe`]: InputHub::unsubscribe
#[derive(Default)]
pub struct InputHub {
    handlers: Mutex<Vec<(SubscriptionId, InputHandler)>>,
    next_id: AtomicU64,
}

impl InputHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler
    pub fn subscribe(&self, handler: InputHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, handler));
        tracing::debug!(?id, "Input subscription added");
        id
    }

    /// Remove a handler; returns false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        let removed = handlers.len() != before;
        if removed {
            tracing::debug!(?id, "Input subscription removed");
        }
        removed
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Deliver a notification to every subscriber
    pub fn dispatch(&self, notification: &InputNotification) {
        let handlers = self.handlers.lock();
        for (_, handler) in handlers.iter() {
            handler(notification);
        }
    }
}

impl std::fmt::Debug for InputHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Synthesizes input on the host.
///
/// Identifiers the backend cannot express return
/// [`MacroError::UnrecognizedInputSymbol`](crate::error::MacroError::UnrecognizedInputSymbol).
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send + Sync {
    /// Move the pointer to an absolute position
    fn move_to(&self, x: i32, y: i32) -> Result<()>;

    /// Press a pointer button
    fn press_button(&self, button: &ButtonId) -> Result<()>;

    /// Release a pointer button
    fn release_button(&self, button: &ButtonId) -> Result<()>;

    /// Scroll by a wheel delta
    fn scroll(&self, dx: i32, dy: i32) -> Result<()>;

    /// Press a key
    fn press_key(&self, key: &KeySymbol) -> Result<()>;

    /// Release a key
    fn release_key(&self, key: &KeySymbol) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn key(name: &str, pressed: bool) -> InputNotification {
        InputNotification::now(InputKind::Key {
            key: KeySymbol::new(name),
            pressed,
        })
    }

    #[test]
    fn test_dispatch_reaches_all_subscribers() {
        let hub = InputHub::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let count = count.clone();
            hub.subscribe(Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        hub.dispatch(&key("a", true));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = InputHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let id = hub.subscribe(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        hub.dispatch(&key("a", true));
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.dispatch(&key("a", false));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_waits_for_running_handler() {
        let hub = Arc::new(InputHub::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);

        let done = finished.clone();
        let id = hub.subscribe(Arc::new(move |_| {
            let _ = entered_tx.send(());
            std::thread::sleep(std::time::Duration::from_millis(50));
            done.fetch_add(1, Ordering::SeqCst);
        }));

        let dispatcher = {
            let hub = hub.clone();
            std::thread::spawn(move || hub.dispatch(&key("a", true)))
        };

        entered_rx.recv().unwrap();
        hub.unsubscribe(id);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        dispatcher.join().unwrap();
    }
}
