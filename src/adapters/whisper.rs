use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::domain::{AudioBuffer, DomainError};
use crate::ports::{TranscribeOptions, Transcriber, Transcript};

/// Transcriber backed by whisper.cpp via whisper-rs.
pub struct WhisperTranscriber {
    context: RwLock<Option<Arc<WhisperContext>>>,
    threads: u32,
}

impl WhisperTranscriber {
    /// Create a new WhisperTranscriber.
    ///
    /// `threads` is the inference thread count; 0 means auto-detect
    /// (cores - 1).
    pub fn new(threads: u32) -> Self {
        let actual_threads = if threads == 0 {
            std::thread::available_parallelism()
                .map(|p| std::cmp::max(1, p.get() as u32 - 1))
                .unwrap_or(1)
        } else {
            threads
        };

        info!(threads = actual_threads, "WhisperTranscriber created");

        Self {
            context: RwLock::new(None),
            threads: actual_threads,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioBuffer,
        options: &TranscribeOptions,
    ) -> Result<Transcript, DomainError> {
        let context = self.context.read().clone();
        let ctx = context.ok_or_else(|| DomainError::Inference("no model loaded".to_string()))?;

        if audio.sample_rate() != 16000 {
            return Err(DomainError::Inference(format!(
                "expected 16kHz audio, got {}Hz",
                audio.sample_rate()
            )));
        }

        if audio.is_empty() {
            return Ok(Transcript {
                text: String::new(),
                detected_language: None,
                duration_ms: 0,
            });
        }

        let samples = audio.samples().to_vec();
        let threads = if options.threads > 0 {
            options.threads
        } else {
            self.threads
        };

        debug!(
            samples = samples.len(),
            duration_secs = audio.duration_secs(),
            threads = threads,
            "starting transcription"
        );

        let start = std::time::Instant::now();

        // The model call is CPU-bound; run it on the blocking pool.
        let language = options.language.clone();
        let (text, detected_language) = tokio::task::spawn_blocking(move || {
            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

            params.set_n_threads(threads as i32);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            if let Some(ref lang) = language {
                params.set_language(Some(lang));
            }

            let mut state = ctx.create_state().map_err(|e| {
                DomainError::Inference(format!("failed to create whisper state: {}", e))
            })?;

            state
                .full(params, &samples)
                .map_err(|e| DomainError::Inference(format!("inference failed: {}", e)))?;

            let num_segments = state
                .full_n_segments()
                .map_err(|e| DomainError::Inference(format!("failed to get segment count: {}", e)))?;

            let mut text = String::new();
            for i in 0..num_segments {
                if let Ok(segment_text) = state.full_get_segment_text(i) {
                    text.push_str(&segment_text);
                }
            }

            let detected_language = state
                .full_lang_id_from_state()
                .ok()
                .and_then(|id| whisper_rs::get_lang_str(id).map(|s| s.to_string()));

            Ok::<(String, Option<String>), DomainError>((text.trim().to_string(), detected_language))
        })
        .await
        .map_err(|e| DomainError::Inference(format!("task join error: {}", e)))??;

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            text_len = text.len(),
            duration_ms = duration_ms,
            detected_language = ?detected_language,
            "transcription complete"
        );

        Ok(Transcript {
            text,
            detected_language,
            duration_ms,
        })
    }

    async fn load_model(&self, path: &Path) -> Result<(), DomainError> {
        if !path.exists() {
            return Err(DomainError::ModelNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        info!(path = ?path, "loading whisper model");

        let path_str = path.to_string_lossy().to_string();

        let ctx = tokio::task::spawn_blocking(move || {
            WhisperContext::new_with_params(&path_str, WhisperContextParameters::default())
                .map_err(|e| DomainError::ModelLoad(e.to_string()))
        })
        .await
        .map_err(|e| DomainError::ModelLoad(format!("task join error: {}", e)))??;

        // Swap only after a successful load, so a failure above leaves the
        // previous model usable.
        *self.context.write() = Some(Arc::new(ctx));

        info!(path = ?path, "whisper model loaded");
        Ok(())
    }

    fn unload_model(&self) {
        let had_model = self.context.read().is_some();
        *self.context.write() = None;

        if had_model {
            info!("whisper model unloaded");
        }
    }

    fn is_model_loaded(&self) -> bool {
        self.context.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcriber_creation() {
        let transcriber = WhisperTranscriber::new(4);
        assert!(!transcriber.is_model_loaded());
    }

    #[tokio::test]
    async fn test_transcribe_without_model_fails() {
        let transcriber = WhisperTranscriber::new(1);
        let buffer = AudioBuffer::from_samples(16000, vec![0.5; 16000]);

        let result = transcriber
            .transcribe(&buffer, &TranscribeOptions::default())
            .await;
        assert!(matches!(result, Err(DomainError::Inference(_))));
    }

    #[tokio::test]
    async fn test_load_model_missing_file() {
        let transcriber = WhisperTranscriber::new(1);
        let result = transcriber
            .load_model(Path::new("/nonexistent/ggml-base.bin"))
            .await;
        assert!(matches!(result, Err(DomainError::ModelNotFound(_))));
        assert!(!transcriber.is_model_loaded());
    }
}
