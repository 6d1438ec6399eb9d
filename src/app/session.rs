use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{
    AtomicSessionState, AudioBuffer, AudioDevice, DomainError, SessionEvent, SessionState,
};
use crate::ports::{AudioCapture, ModelStore, TextOutput, TranscribeOptions, Transcriber};

/// Owns the idle -> recording -> transcribing -> idle lifecycle.
///
/// One controller exists per process. It is the single publisher of
/// `SessionEvent`s; the shell and tests subscribe and never feed back into
/// the state machine except through the command methods below.
pub struct SessionController {
    capture: Arc<dyn AudioCapture>,
    transcriber: Arc<dyn Transcriber>,
    output: Arc<dyn TextOutput>,
    models: Arc<dyn ModelStore>,
    state: Arc<AtomicSessionState>,
    events: broadcast::Sender<SessionEvent>,
    selected_device: RwLock<Option<String>>,
    active_model: RwLock<Option<String>>,
    options: RwLock<TranscribeOptions>,
}

impl SessionController {
    pub fn new(
        capture: Arc<dyn AudioCapture>,
        transcriber: Arc<dyn Transcriber>,
        output: Arc<dyn TextOutput>,
        models: Arc<dyn ModelStore>,
        events: broadcast::Sender<SessionEvent>,
        options: TranscribeOptions,
    ) -> Self {
        Self {
            capture,
            transcriber,
            output,
            models,
            state: Arc::new(AtomicSessionState::default()),
            events,
            selected_device: RwLock::new(None),
            active_model: RwLock::new(None),
            options: RwLock::new(options),
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state.load()
    }

    /// Currently selected input device id, if any.
    pub fn selected_device(&self) -> Option<String> {
        self.selected_device.read().clone()
    }

    /// Name of the currently loaded model, if any.
    pub fn active_model(&self) -> Option<String> {
        self.active_model.read().clone()
    }

    fn emit_log(&self, message: impl Into<String>) {
        let _ = self.events.send(SessionEvent::log(message));
    }

    fn transition(&self, from: SessionState, to: SessionState) {
        self.state.store(to);
        let _ = self.events.send(SessionEvent::StateChanged { from, to });
    }

    /// The toggle trigger: button click or global hotkey.
    ///
    /// Idle starts a recording, Recording stops it and hands the buffer to
    /// the worker, Transcribing ignores the trigger.
    pub async fn toggle(&self) -> Result<(), DomainError> {
        match self.state.load() {
            SessionState::Idle => self.begin_recording().await,
            SessionState::Recording => self.finish_recording().await,
            SessionState::Transcribing => {
                debug!("toggle ignored while transcribing");
                self.emit_log("Transcription in progress; toggle ignored.");
                Ok(())
            }
        }
    }

    async fn begin_recording(&self) -> Result<(), DomainError> {
        let device_id = match self.selected_device.read().clone() {
            Some(id) => id,
            None => {
                warn!("toggle with no input device selected");
                self.emit_log("Please select an input device.");
                return Err(DomainError::DeviceUnselected);
            }
        };

        match self.capture.start(&device_id).await {
            Ok(()) => {
                self.transition(SessionState::Idle, SessionState::Recording);
                self.emit_log(format!("Recording started on '{}'...", device_id));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, device = %device_id, "failed to start recording");
                self.emit_log(format!("Error starting recording: {}", e));
                Err(e)
            }
        }
    }

    async fn finish_recording(&self) -> Result<(), DomainError> {
        let buffer = match self.capture.stop().await {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!(error = %e, "failed to stop recording");
                self.emit_log(format!("Error stopping recording: {}", e));
                self.transition(SessionState::Recording, SessionState::Idle);
                return Err(e);
            }
        };

        self.emit_log("Recording stopped.");

        if buffer.is_empty() {
            self.emit_log("No audio captured; nothing to transcribe.");
            self.transition(SessionState::Recording, SessionState::Idle);
            return Ok(());
        }

        self.transition(SessionState::Recording, SessionState::Transcribing);
        self.spawn_worker(buffer);
        Ok(())
    }

    /// Run the transcription worker for one finished buffer.
    ///
    /// The state machine guarantees at most one worker at a time: this is
    /// only called on the Recording -> Transcribing edge, and further toggles
    /// are ignored until the worker flips the state back to Idle.
    fn spawn_worker(&self, mut buffer: AudioBuffer) {
        let transcriber = Arc::clone(&self.transcriber);
        let output = Arc::clone(&self.output);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let options = self.options.read().clone();

        tokio::spawn(async move {
            if buffer.normalize() {
                match transcriber.transcribe(&buffer, &options).await {
                    Ok(transcript) => {
                        let _ = events.send(SessionEvent::log(format!(
                            "Transcribed {:.1} s of audio in {} ms.",
                            buffer.duration_secs(),
                            transcript.duration_ms
                        )));
                        match output.copy(&transcript.text) {
                            Ok(()) => {
                                let _ = events
                                    .send(SessionEvent::log("Transcript copied to clipboard."));
                            }
                            Err(e) => {
                                let _ =
                                    events.send(SessionEvent::log(format!("Clipboard: {}", e)));
                            }
                        }
                        let _ = events.send(SessionEvent::TranscriptReady {
                            text: transcript.text,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "transcription worker failed");
                        let _ = events.send(SessionEvent::log(format!("{}", e)));
                    }
                }
            } else {
                let _ = events.send(SessionEvent::log("Audio is silent; nothing to transcribe."));
            }

            state.store(SessionState::Idle);
            let _ = events.send(SessionEvent::StateChanged {
                from: SessionState::Transcribing,
                to: SessionState::Idle,
            });
        });
    }

    /// Select the input device used by the next recording.
    pub fn select_device(&self, device_id: &str) -> Result<(), DomainError> {
        let devices = self.capture.list_devices()?;
        let device = devices
            .iter()
            .find(|d| d.id == device_id)
            .ok_or_else(|| DomainError::Capture(format!("device not found: {}", device_id)))?;

        self.emit_log(format!(
            "Selected device: {} ({} ch @ {} Hz)",
            device.name, device.input_channels, device.default_sample_rate
        ));
        *self.selected_device.write() = Some(device_id.to_string());
        info!(device_id = %device_id, "input device selected");
        Ok(())
    }

    /// List available input devices.
    pub fn list_devices(&self) -> Result<Vec<AudioDevice>, DomainError> {
        self.capture.list_devices()
    }

    /// Switch to a different transcription model.
    ///
    /// Idle-only: the worker reads the model reference, so a swap while busy
    /// is refused. Weights are downloaded first when missing. Any failure
    /// leaves the previously loaded model in place.
    pub async fn select_model(&self, name: &str) -> Result<(), DomainError> {
        if !self.state.load().can_switch_model() {
            self.emit_log("Cannot switch models while a session is active.");
            return Ok(());
        }

        self.emit_log(format!("Selected model: {}", name));

        if !self.models.is_installed(name) {
            if let Some(entry) = self.models.catalog().get(name) {
                self.emit_log(format!(
                    "Model '{}' not installed; downloading (~{} MiB)...",
                    name, entry.size_mib
                ));
            }
        }

        let path = match self.models.ensure(name).await {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, model = %name, "model fetch failed");
                self.emit_log(format!("{}", e));
                self.log_kept_model();
                return Err(e);
            }
        };

        match self.transcriber.load_model(&path).await {
            Ok(()) => {
                *self.active_model.write() = Some(name.to_string());
                self.emit_log(format!("Loaded model: {}", name));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, model = %name, "model load failed");
                self.emit_log(format!("{}", e));
                self.log_kept_model();
                Err(e)
            }
        }
    }

    fn log_kept_model(&self) {
        if let Some(previous) = self.active_model.read().clone() {
            self.emit_log(format!("Keeping previously loaded model: {}", previous));
        }
    }

    /// Startup sequence: announce the device list, auto-select the first
    /// input device, and load the configured model.
    pub async fn startup(&self, model: &str) {
        self.emit_log("Checking audio devices...");
        match self.capture.list_devices() {
            Ok(devices) if !devices.is_empty() => {
                for device in &devices {
                    self.emit_log(format!(
                        "{}: {} input channel(s) @ {} Hz{}",
                        device.id,
                        device.input_channels,
                        device.default_sample_rate,
                        if device.is_default { " (default)" } else { "" }
                    ));
                }
                let first = devices[0].id.clone();
                if let Err(e) = self.select_device(&first) {
                    warn!(error = %e, "failed to auto-select first device");
                }
            }
            Ok(_) => self.emit_log("No input devices found."),
            Err(e) => self.emit_log(format!("Device enumeration failed: {}", e)),
        }

        // A missing model is already reported through events; nothing more
        // to do here, the user can pick another from the shell.
        let _ = self.select_model(model).await;
    }
}
