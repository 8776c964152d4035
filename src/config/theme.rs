//! Status panel colors
//!
//! Colors are named the way ANSI terminals name them (`"CYAN"`,
//! `"BRIGHT_CYAN"`, `"RESET"`). Missing fields keep their defaults, so a
//! settings file may override a single color.

use serde::{Deserialize, Serialize};

/// Color names for each part of the status panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Panel title
    pub title: String,
    /// Box border
    pub border: String,
    /// Field labels (`Status:`, `Speed:`, `Progress:`)
    pub label: String,
    /// Status text while recording
    pub status_recording: String,
    /// Status text while playing
    pub status_playing: String,
    /// Filled part of the progress bar
    pub progress_bar: String,
    /// Hotkey labels in the guide rows
    pub guide_title: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            title: "BRIGHT_CYAN".to_string(),
            border: "BRIGHT_BLUE".to_string(),
            label: "BRIGHT_WHITE".to_string(),
            status_recording: "BRIGHT_RED".to_string(),
            status_playing: "BRIGHT_GREEN".to_string(),
            progress_bar: "BRIGHT_CYAN".to_string(),
            guide_title: "BRIGHT_YELLOW".to_string(),
        }
    }
}

/// A terminal color as configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    /// Terminal default
    Reset,
}

impl ThemeColor {
    /// Parse a color name; case, spaces and hyphens are ignored
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        let color = match name.as_str() {
            "BLACK" => Self::Black,
            "RED" => Self::Red,
            "GREEN" => Self::Green,
            "YELLOW" => Self::Yellow,
            "BLUE" => Self::Blue,
            "MAGENTA" => Self::Magenta,
            "CYAN" => Self::Cyan,
            "WHITE" => Self::White,
            "BRIGHT_BLACK" | "GREY" | "GRAY" => Self::BrightBlack,
            "BRIGHT_RED" => Self::BrightRed,
            "BRIGHT_GREEN" => Self::BrightGreen,
            "BRIGHT_YELLOW" => Self::BrightYellow,
            "BRIGHT_BLUE" => Self::BrightBlue,
            "BRIGHT_MAGENTA" | "HEADER" => Self::BrightMagenta,
            "BRIGHT_CYAN" => Self::BrightCyan,
            "BRIGHT_WHITE" => Self::BrightWhite,
            "RESET" | "ENDC" | "DEFAULT" | "" => Self::Reset,
            _ => return None,
        };
        Some(color)
    }

    /// Parse `name`, warning and using the terminal default if unknown
    pub fn parse_or_reset(field: &str, name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!("Unknown theme color {:?} for {}, using default", name, field);
            Self::Reset
        })
    }
}
