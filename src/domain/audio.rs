use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Audio buffer for one recording session.
/// Samples are 32-bit float, mono, 16 kHz, and never touch disk; the buffer
/// is zeroed when dropped.
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct AudioBuffer {
    /// PCM samples in [-1.0, 1.0].
    samples: Vec<f32>,
    /// Sample rate in Hz.
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new empty audio buffer.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    /// Create an audio buffer with pre-allocated capacity.
    pub fn with_capacity(sample_rate: u32, capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            sample_rate,
        }
    }

    /// Create a buffer from already-captured samples.
    pub fn from_samples(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Append samples to the buffer.
    pub fn push_samples(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// Get the samples as a slice.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Peak absolute amplitude of the buffer. 0.0 for an empty buffer.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |max, s| max.max(s.abs()))
    }

    /// Scale the buffer so the peak absolute amplitude becomes 1.0.
    ///
    /// Returns false without touching the samples when the buffer is silent
    /// (peak of exactly zero), since there is nothing to scale against.
    pub fn normalize(&mut self) -> bool {
        let peak = self.peak();
        if peak == 0.0 {
            return false;
        }
        for sample in &mut self.samples {
            *sample /= peak;
        }
        true
    }
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Target sample rate in Hz. Whisper consumes 16 kHz mono.
    pub sample_rate: u32,
    /// Maximum recording duration in seconds; sizes the capture ring buffer.
    /// Frames past the cap are dropped and the drop is logged.
    pub max_capture_secs: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            max_capture_secs: 300,
        }
    }
}

impl AudioConfig {
    /// Capture ring buffer capacity in samples.
    pub fn buffer_capacity(&self) -> usize {
        self.max_capture_secs as usize * self.sample_rate as usize
    }
}

/// Input audio device descriptor, enumerated from the OS audio facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Unique device identifier (device name, suffixed for duplicates).
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// Number of input channels the device offers.
    pub input_channels: u16,
    /// Device default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Whether this is the system default input device.
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_buffer_creation() {
        let buffer = AudioBuffer::new(16000);
        assert!(buffer.is_empty());
        assert_eq!(buffer.sample_rate(), 16000);
    }

    #[test]
    fn test_audio_buffer_push_samples() {
        let mut buffer = AudioBuffer::new(16000);
        buffer.push_samples(&[0.1, -0.2, 0.3]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.samples(), &[0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_audio_buffer_duration() {
        let mut buffer = AudioBuffer::new(16000);
        // 16000 samples = 1 second at 16kHz
        buffer.push_samples(&vec![0.0_f32; 16000]);
        assert!((buffer.duration_secs() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_peak_of_empty_buffer_is_zero() {
        let buffer = AudioBuffer::new(16000);
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_normalize_scales_peak_to_one() {
        let mut buffer = AudioBuffer::from_samples(16000, vec![0.1, -0.2, 0.4, -0.4]);
        assert!(buffer.normalize());

        let expected = [0.25_f32, -0.5, 1.0, -1.0];
        for (got, want) in buffer.samples().iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
        assert!((buffer.peak() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_silent_buffer_is_untouched() {
        let mut buffer = AudioBuffer::from_samples(16000, vec![0.0; 256]);
        assert!(!buffer.normalize());
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_normalize_empty_buffer() {
        let mut buffer = AudioBuffer::new(16000);
        assert!(!buffer.normalize());
    }

    #[test]
    fn test_audio_config_default() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.max_capture_secs, 300);
    }

    #[test]
    fn test_audio_config_buffer_capacity() {
        let config = AudioConfig::default();
        // 300 seconds * 16000 samples/sec
        assert_eq!(config.buffer_capacity(), 4_800_000);
    }
}
