//! Hotkey bindings
//!
//! Maps configured key names to the actions the session controller
//! understands.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::session::types::KeySymbol;

/// Actions triggered by hotkeys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    /// Start or stop recording
    ToggleRecord,
    /// Start or stop playback
    TogglePlay,
    /// Increase playback speed by one step
    SpeedUp,
    /// Decrease playback speed by one step
    SpeedDown,
    /// Switch the display language
    ToggleLanguage,
}

impl HotkeyAction {
    /// All actions in display order
    pub fn all() -> &'static [HotkeyAction] {
        &[
            HotkeyAction::ToggleRecord,
            HotkeyAction::TogglePlay,
            HotkeyAction::SpeedUp,
            HotkeyAction::SpeedDown,
            HotkeyAction::ToggleLanguage,
        ]
    }

    /// Key used in the settings file and in the hotkey map sent to the display
    pub fn config_key(&self) -> &'static str {
        match self {
            HotkeyAction::ToggleRecord => "record",
            HotkeyAction::TogglePlay => "play",
            HotkeyAction::SpeedUp => "speed_up",
            HotkeyAction::SpeedDown => "speed_down",
            HotkeyAction::ToggleLanguage => "toggle_language",
        }
    }

    /// Toggles fire once per physical press; auto-repeat is ignored
    pub fn is_toggle(&self) -> bool {
        !matches!(self, HotkeyAction::SpeedUp | HotkeyAction::SpeedDown)
    }
}

/// Hotkey section of the settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Start/stop recording
    pub record: String,
    /// Start/stop playback
    pub play: String,
    /// Speed up playback
    pub speed_up: String,
    /// Slow down playback
    pub speed_down: String,
    /// Switch display language
    pub toggle_language: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            record: "f8".to_string(),
            play: "f9".to_string(),
            speed_up: "page_up".to_string(),
            speed_down: "page_down".to_string(),
            toggle_language: "f10".to_string(),
        }
    }
}

impl HotkeyConfig {
    /// Configured key name for an action
    pub fn key_name(&self, action: HotkeyAction) -> &str {
        match action {
            HotkeyAction::ToggleRecord => &self.record,
            HotkeyAction::TogglePlay => &self.play,
            HotkeyAction::SpeedUp => &self.speed_up,
            HotkeyAction::SpeedDown => &self.speed_down,
            HotkeyAction::ToggleLanguage => &self.toggle_language,
        }
    }

    /// Normalized key for an action, `None` if the binding is blank
    pub fn key_for(&self, action: HotkeyAction) -> Option<KeySymbol> {
        let name = self.key_name(action);
        if name.trim().is_empty() {
            None
        } else {
            Some(KeySymbol::new(name))
        }
    }

    /// Map of action name to key name, as shown by the display
    pub fn display_map(&self) -> BTreeMap<String, String> {
        HotkeyAction::all()
            .iter()
            .filter_map(|action| {
                self.key_for(*action)
                    .map(|key| (action.config_key().to_string(), key.to_string()))
            })
            .collect()
    }
}

/// Lookup from pressed key to action
#[derive(Debug, Clone, Default)]
pub struct HotkeyBindings {
    by_key: HashMap<KeySymbol, HotkeyAction>,
}

impl HotkeyBindings {
    /// Build bindings; when two actions share a key the first one wins
    pub fn from_config(config: &HotkeyConfig) -> Self {
        let mut by_key = HashMap::new();
        for action in HotkeyAction::all() {
            let Some(key) = config.key_for(*action) else {
                continue;
            };
            if let Some(existing) = by_key.get(&key) {
                tracing::warn!(
                    "Hotkey {} is bound to both {:?} and {:?}; keeping {:?}",
                    key,
                    existing,
                    action,
                    existing
                );
                continue;
            }
            by_key.insert(key, *action);
        }
        Self { by_key }
    }

    /// Action bound to `key`, if any
    pub fn action_for(&self, key: &KeySymbol) -> Option<HotkeyAction> {
        self.by_key.get(key).copied()
    }

    /// Key bound to `action`, if any
    pub fn key_for(&self, action: HotkeyAction) -> Option<&KeySymbol> {
        self.by_key
            .iter()
            .find(|(_, a)| **a == action)
            .map(|(key, _)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = HotkeyBindings::from_config(&HotkeyConfig::default());
        assert_eq!(
            bindings.action_for(&KeySymbol::new("f8")),
            Some(HotkeyAction::ToggleRecord)
        );
        assert_eq!(
            bindings.action_for(&KeySymbol::new("page up")),
            Some(HotkeyAction::SpeedUp)
        );
        assert_eq!(bindings.action_for(&KeySymbol::new("a")), None);
        assert_eq!(
            bindings.key_for(HotkeyAction::TogglePlay),
            Some(&KeySymbol::new("f9"))
        );
    }

    #[test]
    fn test_duplicate_binding_keeps_first() {
        let config = HotkeyConfig {
            play: "F8".to_string(),
            ..Default::default()
        };
        let bindings = HotkeyBindings::from_config(&config);
        assert_eq!(
            bindings.action_for(&KeySymbol::new("f8")),
            Some(HotkeyAction::ToggleRecord)
        );
        assert_eq!(bindings.key_for(HotkeyAction::TogglePlay), None);
    }

    #[test]
    fn test_blank_binding_is_disabled() {
        let config = HotkeyConfig {
            toggle_language: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.key_for(HotkeyAction::ToggleLanguage), None);
        assert!(!config.display_map().contains_key("toggle_language"));
        assert_eq!(config.display_map()["speed_down"], "page_down");
    }

    #[test]
    fn test_toggle_classification() {
        assert!(HotkeyAction::ToggleRecord.is_toggle());
        assert!(HotkeyAction::ToggleLanguage.is_toggle());
        assert!(!HotkeyAction::SpeedUp.is_toggle());
    }
}
