//! Recording and playback sessions
//!
//! # Components
//!
//! - [`Recorder`] - Captures input from the hub into a macro log and saves it
//! - [`Player`] - Replays a macro file on a background thread
//! - [`SessionController`] - Keeps recording and playback mutually exclusive
//! - [`timing`] - Speed-scaled, cancellable waits

pub mod controller;
pub mod player;
pub mod recorder;
pub mod timing;
pub mod types;

pub use controller::{SessionController, SpeedControl};
pub use player::Player;
pub use recorder::Recorder;
pub use timing::{CancelToken, PlaybackClock, SpeedHandle};
pub use types::{
    ButtonId, Event, KeySymbol, MacroLog, MacroMetadata, PlaybackParameters, SessionState,
};
