use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{AudioBuffer, DomainError};

/// Options for a single transcription run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeOptions {
    /// Target language (ISO 639-1 code, e.g., "en").
    /// None for auto-detection.
    pub language: Option<String>,
    /// Number of threads to use (0 = auto).
    pub threads: u32,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: None,
            threads: 0,
        }
    }
}

/// Result of a transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Transcribed text.
    pub text: String,
    /// Detected language (ISO 639-1 code), if the model reports one.
    pub detected_language: Option<String>,
    /// Inference wall time in milliseconds.
    pub duration_ms: u64,
}

/// Port for the speech-to-text model, treated as an opaque audio -> text
/// function.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a finished, peak-normalized audio buffer.
    ///
    /// Runs inference off the caller's thread; the returned future resolves
    /// when the model completes or fails.
    async fn transcribe(
        &self,
        audio: &AudioBuffer,
        options: &TranscribeOptions,
    ) -> Result<Transcript, DomainError>;

    /// Load model weights from the given path, replacing the current model.
    ///
    /// On failure the previously loaded model (if any) stays in place.
    async fn load_model(&self, path: &Path) -> Result<(), DomainError>;

    /// Unload the current model to free resources.
    fn unload_model(&self);

    /// Check if a model is currently loaded.
    fn is_model_loaded(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcribe_options_default() {
        let options = TranscribeOptions::default();
        assert!(options.language.is_none());
        assert_eq!(options.threads, 0);
    }
}
