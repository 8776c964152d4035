//! Internationalization (i18n) support
//!
//! Provides language selection and translation functions.
//!
//! The `i18n!` macro is initialized at the crate root (lib.rs).

use rust_i18n::t;

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh-CN", alias = "zh")]
    SimplifiedChinese,
}

impl Language {
    /// Get the locale code for this language
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::SimplifiedChinese => "zh-CN",
        }
    }

    /// Get the display name for this language (in its native script)
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::SimplifiedChinese => "简体中文",
        }
    }

    /// Get all available languages
    pub fn all() -> &'static [Language] {
        &[Language::English, Language::SimplifiedChinese]
    }

    /// Parse a language from its locale code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::English),
            "zh-CN" | "zh" => Some(Language::SimplifiedChinese),
            _ => None,
        }
    }

    /// The language after this one, wrapping around
    pub fn next(&self) -> Self {
        let all = Self::all();
        let index = all.iter().position(|l| l == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }
}

/// Set the current language
pub fn set_language(lang: Language) {
    rust_i18n::set_locale(lang.code());
}

/// Get the current language
pub fn current_language() -> Language {
    let locale = rust_i18n::locale();
    Language::from_code(&locale).unwrap_or_default()
}

/// Message shown before exiting on an unrecoverable error
pub fn fatal_error_prompt() -> String {
    t!("fatal_error_prompt").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_next_cycles() {
        assert_eq!(Language::English.next(), Language::SimplifiedChinese);
        assert_eq!(Language::SimplifiedChinese.next(), Language::English);
    }

    #[test]
    fn test_from_code() {
        for lang in Language::all() {
            assert_eq!(Language::from_code(lang.code()), Some(*lang));
        }
        assert_eq!(Language::from_code("zh"), Some(Language::SimplifiedChinese));
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    #[serial]
    fn test_translations_follow_locale() {
        set_language(Language::SimplifiedChinese);
        assert_eq!(current_language(), Language::SimplifiedChinese);
        assert_eq!(t!("status.ready"), "就绪");

        set_language(Language::English);
        assert_eq!(t!("status.ready"), "Ready");
        assert_eq!(
            t!("status.saved", filename = "macro.json"),
            "Saved: macro.json"
        );
    }
}
