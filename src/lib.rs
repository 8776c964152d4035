//! # macrokey-rs: Mouse and Keyboard Macro Recorder
//!
//! Records pointer and keyboard input into a timestamped JSON log and replays
//! it later, faster or slower, once or in a loop. Everything is driven by
//! global hotkeys while a small status panel shows what is going on.
//!
//! ## Architecture
//!
//! - **Input**: An `rdev` hook thread feeds an [`input::InputHub`]; replay goes
//!   out through an [`input::InputInjector`]
//! - **Session**: [`session::Recorder`] and [`session::Player`] behind a
//!   [`session::SessionController`] that keeps them mutually exclusive
//! - **Status**: [`status::StatusReporter`] implementations for the terminal
//!   and for headless logging
//! - **Communication**: Crossbeam channels carry hotkey actions to the
//!   dispatch thread
//!
//! ## Configuration
//!
//! Settings are read from `settings.json` (created with defaults on first
//! run). The log file goes to the platform data directory under
//! `dev.macrokey.macrokey-rs`.
//!
//! ## Example
//!
//! ```ignore
//! use macrokey_rs::{
//!     config::{AppConfig, HotkeyBindings},
//!     input::{HotkeyListener, InputHub, RdevHook, RdevInjector},
//!     session::{Player, Recorder, SessionController},
//!     status::TerminalPanel,
//! };
//! use std::sync::Arc;
//!
//! let config = AppConfig::load_or_create("settings.json");
//! let hub = Arc::new(InputHub::new());
//! let _hook = RdevHook::spawn(hub.clone())?;
//! let reporter = Arc::new(TerminalPanel::stdout());
//!
//! let recorder = Recorder::new(hub.clone(), reporter.clone(), &config.macro_filename);
//! let player = Player::new(reporter.clone(), Arc::new(RdevInjector::new()), Default::default());
//! let mut controller = SessionController::new(recorder, player, reporter);
//!
//! let (_listener, actions) =
//!     HotkeyListener::attach(hub, HotkeyBindings::from_config(&config.hotkeys));
//! for action in actions {
//!     controller.handle(action);
//! }
//! ```

rust_i18n::i18n!("locales", fallback = "en");

pub mod config;
pub mod error;
pub mod i18n;
pub mod input;
pub mod session;
pub mod status;

// Re-export commonly used types
pub use config::{AppConfig, HotkeyAction, HotkeyConfig};
pub use error::{MacroError, Result};
pub use session::{Event, MacroLog, Player, Recorder, SessionController, SessionState};
pub use status::StatusReporter;
