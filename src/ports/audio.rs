use async_trait::async_trait;

use crate::domain::{AudioBuffer, AudioDevice, DomainError};

/// Port for microphone capture.
///
/// Implementations open a mono 16 kHz input stream on the selected device and
/// append delivered frames to an in-memory buffer. Non-fatal stream
/// conditions (overruns, device hiccups) are reported as session log events,
/// never as errors.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Open the input stream on the given device and begin buffering frames.
    ///
    /// Fails with `StreamOpen` if the device id is unknown or the audio
    /// facility rejects the stream parameters.
    async fn start(&self, device_id: &str) -> Result<(), DomainError>;

    /// Close the stream and return the accumulated buffer.
    ///
    /// Idempotent: with no open stream this returns an empty buffer.
    async fn stop(&self) -> Result<AudioBuffer, DomainError>;

    /// List available input devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>, DomainError>;
}
