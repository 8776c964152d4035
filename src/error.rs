//! Error handling for macrokey-rs
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application. Every variant except
//! [`MacroError::HookUnavailable`] is recoverable: callers surface it as a
//! status message and keep running.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionState;

/// Main error type for macrokey-rs operations
#[derive(Error, Debug)]
pub enum MacroError {
    /// The macro file to play does not exist
    #[error("Macro file not found: {}", .0.display())]
    MacroFileMissing(PathBuf),

    /// The macro file exists but is not a well-formed event log
    #[error("Macro file invalid: {0}")]
    MacroFileInvalid(String),

    /// Recording and playback were requested at the same time
    #[error("Cannot start {requested} while {active} is active")]
    ModeConflict {
        active: SessionState,
        requested: SessionState,
    },

    /// The component is already running
    #[error("Already {0}")]
    AlreadyActive(&'static str),

    /// Writing the macro file failed, including the fallback location
    #[error("Failed to save macro to {} (fallback {}): {message}", .path.display(), .fallback.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "unavailable".to_string()))]
    PersistenceFailure {
        path: PathBuf,
        fallback: Option<PathBuf>,
        message: String,
    },

    /// A key or button identifier the host backend cannot express
    #[error("Unrecognized input symbol: {0}")]
    UnrecognizedInputSymbol(String),

    /// The host backend rejected a synthesized event
    #[error("Input injection error: {0}")]
    Injection(String),

    /// No usable OS input hook could be installed
    #[error("Input hook unavailable: {0}")]
    HookUnavailable(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<MacroError>,
    },
}

impl MacroError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        MacroError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &MacroError {
        match self {
            MacroError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the process should exit on this error
    pub fn is_fatal(&self) -> bool {
        matches!(self.root(), MacroError::HookUnavailable(_))
    }
}

impl From<serde_json::Error> for MacroError {
    fn from(err: serde_json::Error) -> Self {
        MacroError::Serialization(err.to_string())
    }
}

/// Result type alias for macrokey-rs operations
pub type Result<T> = std::result::Result<T, MacroError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| MacroError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| MacroError::Io(e).with_context(f()))
    }
}
