//! `rdev` host backend
//!
//! [`RdevHook`] runs `rdev::listen` on a dedicated thread and feeds an
//! [`InputHub`]. [`RdevInjector`] synthesizes events with `rdev::simulate`.
//! The name tables below define the on-disk spelling of keys and buttons;
//! they are the only place host key codes appear.

use rdev::{Button, EventType, Key};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::{InputHub, InputInjector, InputKind, InputNotification};
use crate::error::{MacroError, Result};
use crate::session::types::{ButtonId, KeySymbol};

/// How long `listen` must survive before the hook counts as installed
const STARTUP_GRACE: Duration = Duration::from_millis(250);

/// Pause after each synthesized event so the host can process it
const SIMULATE_SETTLE: Duration = Duration::from_millis(1);

/// Canonical key names. The first entry for a key is used when recording.
const KEY_NAMES: &[(&str, Key)] = &[
    ("a", Key::KeyA),
    ("b", Key::KeyB),
    ("c", Key::KeyC),
    ("d", Key::KeyD),
    ("e", Key::KeyE),
    ("f", Key::KeyF),
    ("g", Key::KeyG),
    ("h", Key::KeyH),
    ("i", Key::KeyI),
    ("j", Key::KeyJ),
    ("k", Key::KeyK),
    ("l", Key::KeyL),
    ("m", Key::KeyM),
    ("n", Key::KeyN),
    ("o", Key::KeyO),
    ("p", Key::KeyP),
    ("q", Key::KeyQ),
    ("r", Key::KeyR),
    ("s", Key::KeyS),
    ("t", Key::KeyT),
    ("u", Key::KeyU),
    ("v", Key::KeyV),
    ("w", Key::KeyW),
    ("x", Key::KeyX),
    ("y", Key::KeyY),
    ("z", Key::KeyZ),
    ("0", Key::Num0),
    ("1", Key::Num1),
    ("2", Key::Num2),
    ("3", Key::Num3),
    ("4", Key::Num4),
    ("5", Key::Num5),
    ("6", Key::Num6),
    ("7", Key::Num7),
    ("8", Key::Num8),
    ("9", Key::Num9),
    ("f1", Key::F1),
    ("f2", Key::F2),
    ("f3", Key::F3),
    ("f4", Key::F4),
    ("f5", Key::F5),
    ("f6", Key::F6),
    ("f7", Key::F7),
    ("f8", Key::F8),
    ("f9", Key::F9),
    ("f10", Key::F10),
    ("f11", Key::F11),
    ("f12", Key::F12),
    ("space", Key::Space),
    ("enter", Key::Return),
    ("tab", Key::Tab),
    ("backspace", Key::Backspace),
    ("esc", Key::Escape),
    ("delete", Key::Delete),
    ("insert", Key::Insert),
    ("home", Key::Home),
    ("end", Key::End),
    ("page_up", Key::PageUp),
    ("page_down", Key::PageDown),
    ("up", Key::UpArrow),
    ("down", Key::DownArrow),
    ("left", Key::LeftArrow),
    ("right", Key::RightArrow),
    ("shift", Key::ShiftLeft),
    ("shift_r", Key::ShiftRight),
    ("ctrl", Key::ControlLeft),
    ("ctrl_r", Key::ControlRight),
    ("alt", Key::Alt),
    ("alt_gr", Key::AltGr),
    ("cmd", Key::MetaLeft),
    ("cmd_r", Key::MetaRight),
    ("caps_lock", Key::CapsLock),
    ("num_lock", Key::NumLock),
    ("scroll_lock", Key::ScrollLock),
    ("print_screen", Key::PrintScreen),
    ("pause", Key::Pause),
    ("fn", Key::Function),
    ("`", Key::BackQuote),
    ("-", Key::Minus),
    ("=", Key::Equal),
    ("[", Key::LeftBracket),
    ("]", Key::RightBracket),
    (";", Key::SemiColon),
    ("'", Key::Quote),
    ("\\", Key::BackSlash),
    ("intl_backslash", Key::IntlBackslash),
    (",", Key::Comma),
    (".", Key::Dot),
    ("/", Key::Slash),
    ("kp_enter", Key::KpReturn),
    ("kp_minus", Key::KpMinus),
    ("kp_plus", Key::KpPlus),
    ("kp_multiply", Key::KpMultiply),
    ("kp_divide", Key::KpDivide),
    ("kp_delete", Key::KpDelete),
    ("kp_0", Key::Kp0),
    ("kp_1", Key::Kp1),
    ("kp_2", Key::Kp2),
    ("kp_3", Key::Kp3),
    ("kp_4", Key::Kp4),
    ("kp_5", Key::Kp5),
    ("kp_6", Key::Kp6),
    ("kp_7", Key::Kp7),
    ("kp_8", Key::Kp8),
    ("kp_9", Key::Kp9),
];

/// Alternative spellings accepted in files and settings
const KEY_ALIASES: &[(&str, Key)] = &[
    ("return", Key::Return),
    ("escape", Key::Escape),
    ("del", Key::Delete),
    ("pageup", Key::PageUp),
    ("pagedown", Key::PageDown),
    ("shift_l", Key::ShiftLeft),
    ("ctrl_l", Key::ControlLeft),
    ("alt_l", Key::Alt),
    ("alt_r", Key::AltGr),
    ("cmd_l", Key::MetaLeft),
    ("super", Key::MetaLeft),
    ("win", Key::MetaLeft),
    ("up_arrow", Key::UpArrow),
    ("down_arrow", Key::DownArrow),
    ("left_arrow", Key::LeftArrow),
    ("right_arrow", Key::RightArrow),
    (" ", Key::Space),
];

const UNKNOWN_PREFIX: &str = "unknown:";

/// Stable name for a host key
pub fn key_to_symbol(key: Key) -> KeySymbol {
    match KEY_NAMES.iter().find(|(_, k)| *k == key) {
        Some((name, _)) => KeySymbol::new(name),
        None => match key {
            Key::Unknown(code) => KeySymbol::new(format!("{UNKNOWN_PREFIX}{code}")),
            other => KeySymbol::new(format!("{other:?}")),
        },
    }
}

/// Host key for a stable name
pub fn symbol_to_key(symbol: &KeySymbol) -> Result<Key> {
    let name = symbol.as_str();
    if let Some((_, key)) = KEY_NAMES
        .iter()
        .chain(KEY_ALIASES.iter())
        .find(|(n, _)| *n == name)
    {
        return Ok(*key);
    }
    name.strip_prefix(UNKNOWN_PREFIX)
        .and_then(|code| code.parse::<u32>().ok())
        .map(Key::Unknown)
        .ok_or_else(|| MacroError::UnrecognizedInputSymbol(name.to_string()))
}

/// Stable name for a host button
pub fn button_to_id(button: Button) -> ButtonId {
    match button {
        Button::Left => ButtonId::left(),
        Button::Right => ButtonId::right(),
        Button::Middle => ButtonId::middle(),
        Button::Unknown(code) => ButtonId::new(format!("{UNKNOWN_PREFIX}{code}")),
    }
}

/// Host button for a stable name
pub fn id_to_button(id: &ButtonId) -> Result<Button> {
    match id.as_str() {
        "left" => Ok(Button::Left),
        "right" => Ok(Button::Right),
        "middle" => Ok(Button::Middle),
        other => other
            .strip_prefix(UNKNOWN_PREFIX)
            .and_then(|code| code.parse::<u8>().ok())
            .map(Button::Unknown)
            .ok_or_else(|| MacroError::UnrecognizedInputSymbol(other.to_string())),
    }
}

/// Convert an `rdev` event, tracking the pointer for button and wheel events
fn convert(event: &EventType, pointer: &mut (i32, i32)) -> InputKind {
    match *event {
        EventType::MouseMove { x, y } => {
            *pointer = (x.round() as i32, y.round() as i32);
            InputKind::PointerMoved {
                x: pointer.0,
                y: pointer.1,
            }
        }
        EventType::ButtonPress(button) => InputKind::Button {
            x: pointer.0,
            y: pointer.1,
            button: button_to_id(button),
            pressed: true,
        },
        EventType::ButtonRelease(button) => InputKind::Button {
            x: pointer.0,
            y: pointer.1,
            button: button_to_id(button),
            pressed: false,
        },
        EventType::Wheel { delta_x, delta_y } => InputKind::Scroll {
            x: pointer.0,
            y: pointer.1,
            dx: delta_x.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            dy: delta_y.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        },
        EventType::KeyPress(key) => InputKind::Key {
            key: key_to_symbol(key),
            pressed: true,
        },
        EventType::KeyRelease(key) => InputKind::Key {
            key: key_to_symbol(key),
            pressed: false,
        },
    }
}

/// Global OS input hook.
///
/// `rdev::listen` never returns once installed, so the thread lives for the
/// rest of the process; subscribers come and go through the hub.
pub struct RdevHook {
    _thread: JoinHandle<()>,
}

impl RdevHook {
    /// Install the hook, feeding `hub`.
    ///
    /// Fails with [`MacroError::HookUnavailable`] if the platform refuses the
    /// hook (no display server, missing accessibility permission, ...).
    pub fn spawn(hub: Arc<InputHub>) -> Result<Self> {
        let (err_tx, err_rx) = crossbeam_channel::bounded::<String>(1);

        let thread = std::thread::Builder::new()
            .name("input-hook".to_string())
            .spawn(move || {
                let mut pointer = (0, 0);
                let result = rdev::listen(move |event| {
                    let kind = convert(&event.event_type, &mut pointer);
                    hub.dispatch(&InputNotification::now(kind));
                });
                match result {
                    Ok(()) => {
                        let _ = err_tx.send("input listener exited".to_string());
                    }
                    Err(e) => {
                        tracing::error!("Input listener failed: {:?}", e);
                        let _ = err_tx.send(format!("{:?}", e));
                    }
                }
            })
            .map_err(|e| MacroError::HookUnavailable(e.to_string()))?;

        match err_rx.recv_timeout(STARTUP_GRACE) {
            Ok(message) => Err(MacroError::HookUnavailable(message)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(
                MacroError::HookUnavailable("input listener thread exited".to_string()),
            ),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                tracing::info!("Input hook installed");
                Ok(Self { _thread: thread })
            }
        }
    }
}

/// Injects events through `rdev::simulate`
#[derive(Debug, Default)]
pub struct RdevInjector;

impl RdevInjector {
    /// Create an injector
    pub fn new() -> Self {
        Self
    }

    fn send(&self, event: EventType) -> Result<()> {
        rdev::simulate(&event)
            .map_err(|e| MacroError::Injection(format!("{:?} rejected: {:?}", event, e)))?;
        std::thread::sleep(SIMULATE_SETTLE);
        Ok(())
    }
}

impl InputInjector for RdevInjector {
    fn move_to(&self, x: i32, y: i32) -> Result<()> {
        self.send(EventType::MouseMove {
            x: f64::from(x),
            y: f64::from(y),
        })
    }

    fn press_button(&self, button: &ButtonId) -> Result<()> {
        self.send(EventType::ButtonPress(id_to_button(button)?))
    }

    fn release_button(&self, button: &ButtonId) -> Result<()> {
        self.send(EventType::ButtonRelease(id_to_button(button)?))
    }

    fn scroll(&self, dx: i32, dy: i32) -> Result<()> {
        self.send(EventType::Wheel {
            delta_x: i64::from(dx),
            delta_y: i64::from(dy),
        })
    }

    fn press_key(&self, key: &KeySymbol) -> Result<()> {
        self.send(EventType::KeyPress(symbol_to_key(key)?))
    }

    fn release_key(&self, key: &KeySymbol) -> Result<()> {
        self.send(EventType::KeyRelease(symbol_to_key(key)?))
    }
}
