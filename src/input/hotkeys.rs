//! Hotkey listener
//!
//! Subscribes to the input hub and forwards bound key presses to the
//! hotkey-dispatch thread over a channel. The callback only does a map
//! lookup and a non-blocking send, so it never stalls the hook thread.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::{InputHub, InputKind, InputNotification, SubscriptionId};
use crate::config::{HotkeyAction, HotkeyBindings};
use crate::session::types::KeySymbol;

/// Capacity of the action queue; excess presses are dropped
const ACTION_QUEUE_SIZE: usize = 32;

/// Live subscription that turns key presses into [`HotkeyAction`]s.
///
/// Unsubscribes when dropped.
pub struct HotkeyListener {
    hub: Arc<InputHub>,
    subscription: SubscriptionId,
}

impl HotkeyListener {
    /// Subscribe to `hub` and return the receiving end of the action queue
    pub fn attach(hub: Arc<InputHub>, bindings: HotkeyBindings) -> (Self, Receiver<HotkeyAction>) {
        let (tx, rx) = bounded(ACTION_QUEUE_SIZE);
        let filter = HotkeyFilter::new(bindings, tx);
        let subscription = hub.subscribe(Arc::new(move |n: &InputNotification| filter.handle(n)));
        (Self { hub, subscription }, rx)
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.subscription);
    }
}

struct HotkeyFilter {
    bindings: HotkeyBindings,
    held: Mutex<HashSet<KeySymbol>>,
    tx: Sender<HotkeyAction>,
}

impl HotkeyFilter {
    fn new(bindings: HotkeyBindings, tx: Sender<HotkeyAction>) -> Self {
        Self {
            bindings,
            held: Mutex::new(HashSet::new()),
            tx,
        }
    }

    fn handle(&self, notification: &InputNotification) {
        let InputKind::Key { key, pressed } = &notification.kind else {
            return;
        };
        let Some(action) = self.bindings.action_for(key) else {
            return;
        };

        if !*pressed {
            self.held.lock().remove(key);
            return;
        }

        let repeated = !self.held.lock().insert(key.clone());
        if repeated && action.is_toggle() {
            return;
        }

        match self.tx.try_send(action) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Hotkey queue full, dropping {:?}", action);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HotkeyConfig;

    fn key(name: &str, pressed: bool) -> InputNotification {
        InputNotification::now(InputKind::Key {
            key: KeySymbol::new(name),
            pressed,
        })
    }

    fn setup() -> (Arc<InputHub>, HotkeyListener, Receiver<HotkeyAction>) {
        let hub = Arc::new(InputHub::new());
        let bindings = HotkeyBindings::from_config(&HotkeyConfig::default());
        let (listener, rx) = HotkeyListener::attach(hub.clone(), bindings);
        (hub, listener, rx)
    }

    #[test]
    fn test_bound_press_is_forwarded() {
        let (hub, _listener, rx) = setup();
        hub.dispatch(&key("f8", true));
        hub.dispatch(&key("f8", false));
        hub.dispatch(&key("a", true));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![HotkeyAction::ToggleRecord]);
    }

    #[test]
    fn test_toggle_ignores_auto_repeat() {
        let (hub, _listener, rx) = setup();
        hub.dispatch(&key("f9", true));
        hub.dispatch(&key("f9", true));
        hub.dispatch(&key("f9", true));
        hub.dispatch(&key("f9", false));
        hub.dispatch(&key("f9", true));
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![HotkeyAction::TogglePlay, HotkeyAction::TogglePlay]
        );
    }

    #[test]
    fn test_speed_keys_repeat() {
        let (hub, _listener, rx) = setup();
        hub.dispatch(&key("page_up", true));
        hub.dispatch(&key("page_up", true));
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (hub, listener, _rx) = setup();
        assert_eq!(hub.subscriber_count(), 1);
        drop(listener);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
