//! Session data types
//!
//! The event model shared by the recorder and the player, the persisted
//! macro log, and the session state machine's states.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{MacroError, Result, ResultExt};

/// State of the recording/playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Neither recording nor playing
    #[default]
    Idle,
    /// Capturing input into a macro log
    Recording,
    /// Replaying a macro log
    Playing,
    /// Recording stop requested, log being flushed
    StoppingRecording,
    /// Playback stop requested, replay loop being joined
    StoppingPlaying,
}

impl SessionState {
    /// Check if currently recording (including the flush phase)
    pub fn is_recording(&self) -> bool {
        matches!(
            self,
            SessionState::Recording | SessionState::StoppingRecording
        )
    }

    /// Check if currently playing (including the join phase)
    pub fn is_playing(&self) -> bool {
        matches!(self, SessionState::Playing | SessionState::StoppingPlaying)
    }

    /// Check if idle
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Playing => "Playing",
            SessionState::StoppingRecording => "StoppingRecording",
            SessionState::StoppingPlaying => "StoppingPlaying",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Speed and loop count for a replay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParameters {
    /// Playback speed multiplier (1.0 = real-time, 2.0 = twice as fast)
    pub speed: f64,
    /// Number of full passes (0 = loop until stopped)
    pub repeats: u32,
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self {
            speed: 1.0,
            repeats: 0,
        }
    }
}

impl PlaybackParameters {
    /// Whether playback loops until stopped
    pub fn is_infinite(&self) -> bool {
        self.repeats == 0
    }
}

/// Lowercase, underscore-separated form of a key or button name.
///
/// Identifiers written as `Key.page_up` or `Button.left` keep only the name.
fn normalize_symbol(raw: &str) -> String {
    if raw.chars().count() == 1 {
        return raw.to_lowercase();
    }

    let trimmed = raw.trim();
    let name = ["key.", "button."]
        .iter()
        .find_map(|prefix| {
            trimmed
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &trimmed[prefix.len()..])
        })
        .unwrap_or(trimmed);

    if name.chars().count() == 1 {
        return name.to_lowercase();
    }

    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Host-independent name of a keyboard key (`"f8"`, `"a"`, `"page_up"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct KeySymbol(String);

impl KeySymbol {
    /// Create a key symbol, normalizing its spelling
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(normalize_symbol(name.as_ref()))
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for KeySymbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for KeySymbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<KeySymbol> for String {
    fn from(value: KeySymbol) -> Self {
        value.0
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host-independent name of a pointer button (`"left"`, `"right"`, `"middle"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ButtonId(String);

impl ButtonId {
    /// Create a button identifier, normalizing its spelling
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(normalize_symbol(name.as_ref()))
    }

    /// Primary button
    pub fn left() -> Self {
        Self::new("left")
    }

    /// Secondary button
    pub fn right() -> Self {
        Self::new("right")
    }

    /// Wheel button
    pub fn middle() -> Self {
        Self::new("middle")
    }

    /// The normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ButtonId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<ButtonId> for String {
    fn from(value: ButtonId) -> Self {
        value.0
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Integer screen coordinate; fractional values from older files are rounded.
fn de_coord<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("coordinate must be finite"));
    }
    Ok(value.round() as i32)
}

/// One recorded input action.
///
/// `time` is seconds since the recording started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Pointer moved to an absolute position
    Move {
        time: f64,
        #[serde(deserialize_with = "de_coord")]
        x: i32,
        #[serde(deserialize_with = "de_coord")]
        y: i32,
    },
    /// Pointer button pressed or released
    Click {
        time: f64,
        #[serde(deserialize_with = "de_coord")]
        x: i32,
        #[serde(deserialize_with = "de_coord")]
        y: i32,
        button: ButtonId,
        pressed: bool,
    },
    /// Wheel scrolled
    Scroll {
        time: f64,
        #[serde(deserialize_with = "de_coord")]
        x: i32,
        #[serde(deserialize_with = "de_coord")]
        y: i32,
        #[serde(deserialize_with = "de_coord")]
        dx: i32,
        #[serde(deserialize_with = "de_coord")]
        dy: i32,
    },
    /// Key pressed
    KeyPress { time: f64, key: KeySymbol },
    /// Key released
    KeyRelease { time: f64, key: KeySymbol },
}

impl Event {
    /// Every persisted `type` tag
    pub const KINDS: [&'static str; 5] = ["move", "click", "scroll", "key_press", "key_release"];

    /// Seconds since the recording started
    pub fn time(&self) -> f64 {
        match self {
            Event::Move { time, .. }
            | Event::Click { time, .. }
            | Event::Scroll { time, .. }
            | Event::KeyPress { time, .. }
            | Event::KeyRelease { time, .. } => *time,
        }
    }

    /// The persisted `type` tag
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Move { .. } => "move",
            Event::Click { .. } => "click",
            Event::Scroll { .. } => "scroll",
            Event::KeyPress { .. } => "key_press",
            Event::KeyRelease { .. } => "key_release",
        }
    }
}

/// Descriptive data written alongside the events; ignored on load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroMetadata {
    /// When the recording was saved
    pub recorded_at: chrono::DateTime<chrono::Utc>,
    /// Seconds between the first and last event
    pub duration: f64,
    /// Number of events
    pub event_count: usize,
    /// Minimum pointer-motion interval used while recording (seconds)
    pub sample_rate: f64,
}

impl MacroMetadata {
    /// Describe a finished log
    pub fn describe(log: &MacroLog, sample_rate: f64) -> Self {
        Self {
            recorded_at: chrono::Utc::now(),
            duration: log.duration(),
            event_count: log.len(),
            sample_rate,
        }
    }
}

#[derive(Serialize)]
struct MacroFileRef<'a> {
    metadata: &'a MacroMetadata,
    events: &'a [Event],
}

/// An ordered, time-sorted sequence of events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroLog {
    events: Vec<Event>,
}

impl MacroLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from events, rejecting unsorted or non-finite timestamps
    pub fn from_events(events: Vec<Event>) -> Result<Self> {
        let mut previous = 0.0_f64;
        for (index, event) in events.iter().enumerate() {
            let time = event.time();
            if !time.is_finite() || time < 0.0 {
                return Err(MacroError::MacroFileInvalid(format!(
                    "event {} has invalid time {}",
                    index, time
                )));
            }
            if time < previous {
                return Err(MacroError::MacroFileInvalid(format!(
                    "event {} at {:.6}s precedes the previous event at {:.6}s",
                    index, time, previous
                )));
            }
            previous = time;
        }
        Ok(Self { events })
    }

    /// Append an event. Callers guarantee non-decreasing time.
    pub fn push(&mut self, event: Event) {
        debug_assert!(self
            .events
            .last()
            .map(|last| last.time() <= event.time())
            .unwrap_or(true));
        self.events.push(event);
    }

    /// All events in order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take ownership of the events
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the first event; replay treats it as the zero point
    pub fn start_time(&self) -> f64 {
        self.events.first().map(Event::time).unwrap_or(0.0)
    }

    /// Seconds between the first and last event
    pub fn duration(&self) -> f64 {
        self.events
            .last()
            .map(|last| last.time() - self.start_time())
            .unwrap_or(0.0)
    }

    /// Parse either a bare event array or an object with an `events` field
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| MacroError::MacroFileInvalid(e.to_string()))?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(mut map) => match map.remove("events") {
                Some(serde_json::Value::Array(items)) => items,
                Some(other) => {
                    return Err(MacroError::MacroFileInvalid(format!(
                        "`events` must be an array, found {}",
                        json_kind(&other)
                    )))
                }
                None => Vec::new(),
            },
            other => {
                return Err(MacroError::MacroFileInvalid(format!(
                    "expected an event array or an object with `events`, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut events = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item.get("type").and_then(serde_json::Value::as_str) {
                Some(kind) if !Event::KINDS.contains(&kind) => {
                    tracing::warn!(index, kind, "Skipping event of unknown type");
                    continue;
                }
                Some(_) => {}
                None => {
                    return Err(MacroError::MacroFileInvalid(format!(
                        "event {} has no `type`",
                        index
                    )))
                }
            }
            let event: Event = serde_json::from_value(item)
                .map_err(|e| MacroError::MacroFileInvalid(format!("event {}: {}", index, e)))?;
            events.push(event);
        }
        Self::from_events(events)
    }

    /// Load a log from a file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MacroError::MacroFileMissing(path.to_path_buf()),
            _ => MacroError::Io(e),
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize with metadata in the wrapped `{metadata, events}` form
    pub fn to_json(&self, metadata: &MacroMetadata) -> Result<String> {
        let file = MacroFileRef {
            metadata,
            events: &self.events,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Write the log with a single rename so readers never see a partial file
    pub fn save_atomic(&self, path: &Path, metadata: &MacroMetadata) -> Result<()> {
        let json = self.to_json(metadata)?;

        let mut tmp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| {
                MacroError::Config(format!("macro path {:?} has no file name", path))
            })?;
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(MacroError::Io(e).with_context(format!("replacing {}", path.display())));
        }
        Ok(())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
