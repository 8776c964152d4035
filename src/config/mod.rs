//! Configuration module for macrokey-rs
//!
//! Settings live in a JSON file (`settings.json` in the working directory by
//! default). Every field has a default, so a partial file is merged over the
//! defaults and a missing file is created on first run.
//!
//! # App Data Location
//!
//! The log file is written to the platform data directory:
//! - **Linux**: `~/.local/share/dev.macrokey.macrokey-rs/`
//! - **macOS**: `~/Library/Application Support/dev.macrokey.macrokey-rs/`
//! - **Windows**: `%APPDATA%\dev.macrokey.macrokey-rs\`
//!
//! # Example
//!
//! ```ignore
//! use macrokey_rs::config::AppConfig;
//!
//! let config = AppConfig::load_or_create("settings.json");
//! println!("record hotkey: {}", config.hotkeys.record);
//! ```

pub mod hotkeys;
pub mod theme;

pub use hotkeys::{HotkeyAction, HotkeyBindings, HotkeyConfig};
pub use theme::{ThemeColor, ThemeConfig};

use crate::error::{MacroError, Result};
use crate::i18n::Language;
use crate::session::types::PlaybackParameters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.macrokey.macrokey-rs";

/// Default settings filename
pub const SETTINGS_FILE: &str = "settings.json";

/// Log filename inside the app data directory
pub const LOG_FILE: &str = "macro.log";

/// Default macro filename
pub const DEFAULT_MACRO_FILE: &str = "macro.json";

/// Default minimum interval between recorded pointer moves (about 60Hz)
pub const DEFAULT_SAMPLE_RATE: f64 = 0.016;

// ==================== Directories ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        MacroError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            MacroError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Directory containing the running executable
///
/// Used as the second location when a macro cannot be saved where asked.
pub fn program_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

// ==================== App Config ====================

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hotkey bindings
    pub hotkeys: HotkeyConfig,

    /// Playback speed used at startup
    pub default_speed: f64,

    /// Macro file used by record and play
    pub macro_filename: String,

    /// Minimum seconds between two recorded pointer moves
    pub sample_rate: f64,

    /// Playback passes; 0 loops until stopped
    pub repeats: u32,

    /// Display language
    pub language: Language,

    /// Status panel colors
    pub theme: ThemeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hotkeys: HotkeyConfig::default(),
            default_speed: 1.0,
            macro_filename: DEFAULT_MACRO_FILE.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            repeats: 0,
            language: Language::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from `path`, falling back to defaults for missing fields
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MacroError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        let mut config: Self = serde_json::from_str(&content).map_err(|e| {
            MacroError::Config(format!("Failed to parse settings {:?}: {}", path, e))
        })?;
        config.validate();
        Ok(config)
    }

    /// Load settings, writing defaults to `path` if it does not exist.
    ///
    /// An unreadable file yields defaults; a failed write only warns.
    pub fn load_or_create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if path.exists() {
            return Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load settings, using defaults: {}", e);
                Self::default()
            });
        }

        let config = Self::default();
        match config.save(path) {
            Ok(()) => tracing::info!("Created default settings at {:?}", path),
            Err(e) => tracing::warn!("Failed to write default settings: {}", e),
        }
        config
    }

    /// Save settings to `path` as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                MacroError::Config(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| MacroError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            MacroError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }

    /// Replace out-of-range values with defaults
    pub fn validate(&mut self) {
        if !self.default_speed.is_finite() || self.default_speed <= 0.0 {
            tracing::warn!(
                "Invalid default_speed {}, using 1.0",
                self.default_speed
            );
            self.default_speed = 1.0;
        }

        if Duration::try_from_secs_f64(self.sample_rate).is_err() {
            tracing::warn!(
                "Invalid sample_rate {}, using {}",
                self.sample_rate,
                DEFAULT_SAMPLE_RATE
            );
            self.sample_rate = DEFAULT_SAMPLE_RATE;
        }

        if self.macro_filename.trim().is_empty() {
            self.macro_filename = DEFAULT_MACRO_FILE.to_string();
        }
    }

    /// Sampling interval as a duration; unrepresentable rates use the default
    pub fn sample_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.sample_rate)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_SAMPLE_RATE))
    }

    /// Playback parameters at startup
    pub fn playback(&self) -> PlaybackParameters {
        PlaybackParameters {
            speed: self.default_speed,
            repeats: self.repeats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.hotkeys.record, "f8");
        assert_eq!(config.hotkeys.play, "f9");
        assert_eq!(config.default_speed, 1.0);
        assert_eq!(config.macro_filename, "macro.json");
        assert_eq!(config.sample_rate, 0.016);
        assert_eq!(config.repeats, 0);
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"hotkeys": {"record": "F6"}, "default_speed": 2.5}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.hotkeys.record, "F6");
        assert_eq!(config.hotkeys.play, "f9");
        assert_eq!(config.default_speed, 2.5);
        assert_eq!(config.macro_filename, "macro.json");
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let config = AppConfig::load_or_create(&path);
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_or_create_survives_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(AppConfig::load(&path).is_err());
        assert_eq!(AppConfig::load_or_create(&path), AppConfig::default());
    }

    #[test]
    fn test_validate_resets_bad_values() {
        let mut config = AppConfig {
            default_speed: 0.0,
            sample_rate: -1.0,
            macro_filename: " ".to_string(),
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.default_speed, 1.0);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.macro_filename, DEFAULT_MACRO_FILE);
    }

    #[test]
    fn test_huge_sample_rate_is_rejected() {
        let mut config = AppConfig {
            sample_rate: 1e300,
            ..Default::default()
        };
        assert_eq!(
            config.sample_interval(),
            Duration::from_secs_f64(DEFAULT_SAMPLE_RATE)
        );
        config.validate();
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);

        let config = AppConfig {
            sample_rate: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            config.sample_interval(),
            Duration::from_secs_f64(DEFAULT_SAMPLE_RATE)
        );
    }

    #[test]
    fn test_theme_section_is_optional() {
        let config: AppConfig =
            serde_json::from_str(r#"{"theme": {"title": "RED"}}"#).unwrap();
        assert_eq!(config.theme.title, "RED");
        assert_eq!(config.theme.border, ThemeConfig::default().border);

        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.theme, ThemeConfig::default());
    }

    #[test]
    fn test_language_codes_in_file() {
        let config: AppConfig = serde_json::from_str(r#"{"language": "zh"}"#).unwrap();
        assert_eq!(config.language, Language::SimplifiedChinese);

        let json = serde_json::to_string(&AppConfig::default()).unwrap();
        assert!(json.contains(r#""language":"en""#));
    }

    #[test]
    fn test_app_data_dir_uses_app_id() {
        if let Some(dir) = app_data_dir() {
            assert!(dir.ends_with(APP_ID));
        }
    }
}
