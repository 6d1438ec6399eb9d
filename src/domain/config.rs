use serde::{Deserialize, Serialize};

use crate::domain::audio::AudioConfig;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with daily rotation.
    pub file_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

/// Transcription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Selected model name ("tiny", "base", "small", "medium", "large").
    pub model: String,
    /// Language code (e.g., "en", "de") or "auto" for detection.
    pub language: String,
    /// Inference threads (0 = auto-detect, cores - 1).
    pub threads: u32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            language: "auto".to_string(),
            threads: 0,
        }
    }
}

impl TranscriptionConfig {
    /// Language option as passed to the model: None means auto-detect.
    pub fn language_option(&self) -> Option<String> {
        if self.language.is_empty() || self.language == "auto" {
            None
        } else {
            Some(self.language.clone())
        }
    }
}

/// Global-shortcut configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    /// Key that toggles the recording session from any window.
    pub toggle_hotkey: String,
}

impl ShortcutConfig {
    /// Hotkeys offered by the shell's picker.
    pub const CHOICES: [&'static str; 6] = ["CapsLock", "F1", "F2", "F3", "F4", "F5"];
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            toggle_hotkey: "CapsLock".to_string(),
        }
    }
}

/// Main application configuration, persisted as TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub transcription: TranscriptionConfig,
    pub shortcut: ShortcutConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
