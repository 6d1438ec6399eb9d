use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::domain::{AudioBuffer, AudioConfig, AudioDevice, DomainError, SessionEvent};
use crate::ports::AudioCapture;

/// Lock-free ring buffer between the OS audio callback and the drain.
type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

/// Commands sent to the capture thread.
enum CaptureCommand {
    Start {
        device_id: String,
        reply: oneshot::Sender<Result<(), DomainError>>,
    },
    Stop {
        reply: oneshot::Sender<AudioBuffer>,
    },
    Shutdown,
}

/// Frame processing shared by the stream callbacks.
mod frame_processing {
    use super::*;

    pub fn find_device(device_id: &str) -> Result<Device, DomainError> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(|e| {
            DomainError::StreamOpen(format!("failed to enumerate devices: {}", e))
        })?;

        let mut name_counts: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();
        for device in devices {
            if let Ok(name) = device.name() {
                let count = name_counts.entry(name.clone()).or_insert(0);
                let id = if *count == 0 {
                    name.clone()
                } else {
                    format!("{}:{}", name, count)
                };
                *count += 1;

                if id == device_id {
                    return Ok(device);
                }
            }
        }

        Err(DomainError::StreamOpen(format!(
            "input device not found: {}",
            device_id
        )))
    }

    /// Pick a stream configuration, preferring a native mono stream at the
    /// target rate; devices that offer neither get their default config and
    /// the callback downmixes/resamples.
    pub fn pick_stream_config(
        device: &Device,
        target_sample_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), DomainError> {
        if let Ok(supported) = device.supported_input_configs() {
            for range in supported {
                if range.channels() == 1
                    && range.min_sample_rate().0 <= target_sample_rate
                    && range.max_sample_rate().0 >= target_sample_rate
                {
                    let cfg = range.with_sample_rate(cpal::SampleRate(target_sample_rate));
                    let format = cfg.sample_format();
                    return Ok((cfg.into(), format));
                }
            }
        }

        let supported = device.default_input_config().map_err(|e| {
            DomainError::StreamOpen(format!("failed to get default input config: {}", e))
        })?;

        debug!(
            sample_rate = supported.sample_rate().0,
            channels = supported.channels(),
            format = ?supported.sample_format(),
            "falling back to device default config"
        );

        let format = supported.sample_format();
        Ok((supported.into(), format))
    }

    pub fn build_stream(
        device: &Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        target_sample_rate: u32,
        mut producer: RingProducer,
        event_sender: broadcast::Sender<SessionEvent>,
    ) -> Result<Stream, DomainError> {
        let channels = config.channels as usize;
        let device_sample_rate = config.sample_rate.0;

        // Level updates roughly ten times a second, counted in target-rate
        // samples since that is what lands in the ring.
        let samples_per_update = (target_sample_rate / 10) as usize;
        let mut sample_counter = 0usize;
        let mut level_samples = Vec::with_capacity(samples_per_update);
        let mut overflow_announced = false;

        let event_sender_err = event_sender.clone();

        let process = move |data: &[f32]| {
            process_frames(
                data,
                channels,
                device_sample_rate,
                target_sample_rate,
                &mut producer,
                &mut level_samples,
                &mut sample_counter,
                samples_per_update,
                &mut overflow_announced,
                &event_sender,
            );
        };

        let err_fn = move |err: cpal::StreamError| {
            error!(?err, "audio stream error");
            let _ = event_sender_err.send(SessionEvent::log(format!("Audio stream: {}", err)));
        };

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| process(data),
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let float_data: Vec<f32> =
                        data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                    process(&float_data);
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let float_data: Vec<f32> = data
                        .iter()
                        .map(|&s| (f32::from(s) - 32768.0) / 32768.0)
                        .collect();
                    process(&float_data);
                },
                err_fn,
                None,
            ),
            other => {
                return Err(DomainError::StreamOpen(format!(
                    "unsupported sample format: {:?}",
                    other
                )));
            }
        }
        .map_err(|e| DomainError::StreamOpen(format!("failed to build stream: {}", e)))?;

        Ok(stream)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_frames(
        data: &[f32],
        channels: usize,
        device_sample_rate: u32,
        target_sample_rate: u32,
        producer: &mut RingProducer,
        level_samples: &mut Vec<f32>,
        sample_counter: &mut usize,
        samples_per_update: usize,
        overflow_announced: &mut bool,
        event_sender: &broadcast::Sender<SessionEvent>,
    ) {
        // Downmix to mono
        let mono_samples: Vec<f32> = if channels > 1 {
            data.chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        } else {
            data.to_vec()
        };

        // Resample if needed
        let resampled = if device_sample_rate != target_sample_rate {
            resample(&mono_samples, device_sample_rate, target_sample_rate)
        } else {
            mono_samples
        };

        let pushed = producer.push_slice(&resampled);
        if pushed < resampled.len() {
            let dropped = resampled.len() - pushed;
            warn!(dropped, "capture buffer full, dropping samples");
            if !*overflow_announced {
                *overflow_announced = true;
                let _ = event_sender.send(SessionEvent::log(
                    "Recording buffer is full; the rest of this take is being dropped.",
                ));
            }
        }

        // Level update, ~10 Hz
        level_samples.extend_from_slice(&resampled);
        *sample_counter += resampled.len();
        if *sample_counter >= samples_per_update {
            let rms = calculate_rms(level_samples);
            let _ = event_sender.send(SessionEvent::Level { rms });
            level_samples.clear();
            *sample_counter = 0;
        }
    }

    pub fn calculate_rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = samples.iter().map(|&s| f64::from(s).powi(2)).sum();
        ((sum_squares / samples.len() as f64).sqrt() as f32).min(1.0)
    }

    pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
        if from_rate == to_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = f64::from(from_rate) / f64::from(to_rate);
        let output_len = (samples.len() as f64 / ratio).ceil() as usize;
        let mut output = Vec::with_capacity(output_len);

        for i in 0..output_len {
            let src_pos = i as f64 * ratio;
            let src_idx = src_pos.floor() as usize;
            let frac = src_pos.fract() as f32;

            let sample = if src_idx + 1 < samples.len() {
                let s0 = samples[src_idx];
                let s1 = samples[src_idx + 1];
                s0 + (s1 - s0) * frac
            } else if src_idx < samples.len() {
                samples[src_idx]
            } else {
                0.0
            };
            output.push(sample);
        }
        output
    }
}

/// Capture thread runner; the cpal Stream is not Send, so it lives here.
fn capture_thread_main(
    config: AudioConfig,
    event_sender: broadcast::Sender<SessionEvent>,
    mut cmd_rx: mpsc::Receiver<CaptureCommand>,
) {
    let mut stream: Option<Stream> = None;
    let mut ring_consumer: Option<RingConsumer> = None;

    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            CaptureCommand::Start { device_id, reply } => {
                let result = (|| -> Result<(), DomainError> {
                    if stream.is_some() {
                        return Err(DomainError::Capture(
                            "capture stream already open".to_string(),
                        ));
                    }

                    let device = frame_processing::find_device(&device_id)?;
                    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
                    let (stream_config, sample_format) =
                        frame_processing::pick_stream_config(&device, config.sample_rate)?;

                    let ring = HeapRb::<f32>::new(config.buffer_capacity());
                    let (producer, consumer) = ring.split();

                    let new_stream = frame_processing::build_stream(
                        &device,
                        &stream_config,
                        sample_format,
                        config.sample_rate,
                        producer,
                        event_sender.clone(),
                    )?;

                    new_stream
                        .play()
                        .map_err(|e| DomainError::StreamOpen(format!("failed to start stream: {}", e)))?;

                    stream = Some(new_stream);
                    ring_consumer = Some(consumer);

                    info!(device = %device_name, "recording started");
                    Ok(())
                })();
                let _ = reply.send(result);
            }
            CaptureCommand::Stop { reply } => {
                // Dropping the stream closes it; the callback cannot fire
                // past this point, so the drain below sees the final state.
                stream.take();

                let mut buffer = AudioBuffer::new(config.sample_rate);
                if let Some(mut consumer) = ring_consumer.take() {
                    let available = consumer.occupied_len();
                    let mut samples = vec![0.0_f32; available];
                    let read = consumer.pop_slice(&mut samples);
                    samples.truncate(read);
                    buffer.push_samples(&samples);
                    info!(samples = buffer.len(), "recording stopped");
                } else {
                    debug!("stop with no open stream, returning empty buffer");
                }
                let _ = reply.send(buffer);
            }
            CaptureCommand::Shutdown => {
                break;
            }
        }
    }
    debug!("capture thread shutting down");
}

/// cpal-based microphone capture.
///
/// Uses a dedicated capture thread to handle the non-Send Stream type; the
/// async trait methods talk to it over a command channel.
pub struct CpalCapture {
    cmd_tx: mpsc::Sender<CaptureCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CpalCapture {
    /// Spawn the capture thread. Session log and level events are published
    /// on `event_sender`.
    pub fn new(
        config: AudioConfig,
        event_sender: broadcast::Sender<SessionEvent>,
    ) -> Result<Self, DomainError> {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let thread_config = config.clone();
        let thread_handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || capture_thread_main(thread_config, event_sender, cmd_rx))
            .map_err(|e| DomainError::Capture(format!("failed to spawn capture thread: {}", e)))?;

        info!(
            sample_rate = config.sample_rate,
            max_capture_secs = config.max_capture_secs,
            "CpalCapture initialized"
        );

        Ok(Self {
            cmd_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }

    fn enumerate_devices() -> Result<Vec<AudioDevice>, DomainError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host.input_devices().map_err(|e| {
            DomainError::Capture(format!("failed to enumerate devices: {}", e))
        })?;

        let mut result = Vec::new();
        let mut name_counts: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();

        for device in devices {
            if let Ok(name) = device.name() {
                // Duplicate names get an index suffix so ids stay unique.
                let count = name_counts.entry(name.clone()).or_insert(0);
                let id = if *count == 0 {
                    name.clone()
                } else {
                    format!("{}:{}", name, count)
                };
                *count += 1;

                let (input_channels, default_sample_rate) = device
                    .default_input_config()
                    .map(|c| (c.channels(), c.sample_rate().0))
                    .unwrap_or((0, 0));

                result.push(AudioDevice {
                    id,
                    is_default: Some(&name) == default_name.as_ref(),
                    name,
                    input_channels,
                    default_sample_rate,
                });
            }
        }

        debug!(count = result.len(), "listed input devices");
        Ok(result)
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        // try_send: Drop may run on an async runtime thread where blocking
        // sends are not allowed.
        let _ = self.cmd_tx.try_send(CaptureCommand::Shutdown);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn start(&self, device_id: &str) -> Result<(), DomainError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.cmd_tx
            .send(CaptureCommand::Start {
                device_id: device_id.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| DomainError::Capture("capture thread not running".to_string()))?;

        reply_rx
            .await
            .map_err(|_| DomainError::Capture("capture thread did not respond".to_string()))?
    }

    async fn stop(&self) -> Result<AudioBuffer, DomainError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.cmd_tx
            .send(CaptureCommand::Stop { reply: reply_tx })
            .await
            .map_err(|_| DomainError::Capture("capture thread not running".to_string()))?;

        reply_rx
            .await
            .map_err(|_| DomainError::Capture("capture thread did not respond".to_string()))
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>, DomainError> {
        Self::enumerate_devices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_rms() {
        assert_eq!(frame_processing::calculate_rms(&[]), 0.0);
        assert_eq!(frame_processing::calculate_rms(&[0.0, 0.0, 0.0]), 0.0);

        let max_rms = frame_processing::calculate_rms(&[1.0, 1.0, 1.0]);
        assert!((max_rms - 1.0).abs() < 0.001);

        let half_rms = frame_processing::calculate_rms(&[0.5, -0.5, 0.5, -0.5]);
        assert!((half_rms - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_resample_same_rate() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        let result = frame_processing::resample(&samples, 48000, 48000);
        assert_eq!(result, samples);
    }

    #[test]
    fn test_resample_downsample() {
        let samples: Vec<f32> = (0..48).map(|i| i as f32 / 48.0).collect();
        let result = frame_processing::resample(&samples, 48000, 16000);
        assert!(result.len() >= 15 && result.len() <= 17);
        for s in &result {
            assert!((0.0..=1.0).contains(s));
        }
    }

    #[test]
    fn test_resample_upsample() {
        let samples = vec![0.0, 0.25, 0.5, 0.75];
        let result = frame_processing::resample(&samples, 8000, 16000);
        assert!(result.len() >= 7 && result.len() <= 9);
        for s in &result {
            assert!((0.0..=0.75).contains(s));
        }
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_noop() {
        let (events, _) = broadcast::channel(16);
        let capture = CpalCapture::new(AudioConfig::default(), events).unwrap();

        // stop() twice without an open stream: both return empty buffers.
        let first = capture.stop().await.unwrap();
        assert!(first.is_empty());

        let second = capture.stop().await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_start_unknown_device_is_stream_open_error() {
        let (events, _) = broadcast::channel(16);
        let capture = CpalCapture::new(AudioConfig::default(), events).unwrap();

        let result = capture.start("no-such-device-xyz").await;
        assert!(matches!(result, Err(DomainError::StreamOpen(_))));

        // A failed start leaves the session recoverable: stop stays a no-op.
        let buffer = capture.stop().await.unwrap();
        assert!(buffer.is_empty());
    }
}
