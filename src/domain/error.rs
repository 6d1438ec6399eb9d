use crate::domain::session::SessionState;
use thiserror::Error;

/// Domain-level errors for Dictapad.
///
/// Silent recordings and empty buffers are deliberately absent: both are
/// ordinary session outcomes reported through log events, not failures.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("No input device selected")]
    DeviceUnselected,

    #[error("Failed to open input stream: {0}")]
    StreamOpen(String),

    #[error("Audio capture error: {0}")]
    Capture(String),

    #[error("Invalid session state transition from {from:?} to {to:?}")]
    StateTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model integrity check failed: expected {expected}, got {actual}")]
    ModelVerification { expected: String, actual: String },

    #[error("Model download failed: {0}")]
    ModelDownload(String),

    #[error("Transcription failed: {0}")]
    Inference(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Hotkey error: {0}")]
    Hotkey(String),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
