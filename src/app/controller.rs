use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{
    ArboardClipboard, CpalCapture, LocalModelStore, TomlConfigStore, WhisperTranscriber,
};
use crate::app::SessionController;
use crate::domain::config::ShortcutConfig;
use crate::domain::{
    AppConfig, AudioDevice, DomainError, InstalledModel, ModelCatalog, SessionEvent, SessionState,
};
use crate::infrastructure::init_logging;
use crate::ports::{ConfigStore, ModelStore, TranscribeOptions};

/// Application controller: loads configuration, wires the adapters together,
/// and owns the session controller for the lifetime of the process.
pub struct AppController {
    config: RwLock<AppConfig>,
    config_store: Arc<TomlConfigStore>,
    models: Arc<LocalModelStore>,
    session: Arc<SessionController>,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize configuration, logging, and the capture/transcription/
    /// clipboard adapters.
    pub fn new() -> Result<Self, DomainError> {
        let config_store = Arc::new(TomlConfigStore::new()?);
        let config = config_store.load()?;

        let log_guard = init_logging(
            &config_store.logs_dir(),
            &config.logging.level,
            config.logging.file_logging,
        )?;

        info!("Dictapad starting up");

        let (events, _) = broadcast::channel::<SessionEvent>(64);

        let capture = Arc::new(CpalCapture::new(config.audio.clone(), events.clone())?);
        let transcriber = Arc::new(WhisperTranscriber::new(config.transcription.threads));
        let output = Arc::new(ArboardClipboard::new()?);
        let models = Arc::new(LocalModelStore::new(config_store.data_dir())?);

        let options = TranscribeOptions {
            language: config.transcription.language_option(),
            threads: config.transcription.threads,
        };

        let session = Arc::new(SessionController::new(
            capture,
            transcriber,
            output,
            Arc::clone(&models) as Arc<dyn ModelStore>,
            events,
            options,
        ));

        info!(
            model = %config.transcription.model,
            hotkey = %config.shortcut.toggle_hotkey,
            "AppController initialized"
        );

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            models,
            session,
            _log_guard: log_guard,
        })
    }

    /// The session controller.
    pub fn session(&self) -> Arc<SessionController> {
        Arc::clone(&self.session)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// Get the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Current session state.
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Dispatch the toggle trigger into the session.
    pub async fn toggle(&self) -> Result<(), DomainError> {
        self.session.toggle().await
    }

    /// List available input devices.
    pub fn list_devices(&self) -> Result<Vec<AudioDevice>, DomainError> {
        self.session.list_devices()
    }

    /// Select the input device used by the next recording.
    pub fn select_device(&self, device_id: &str) -> Result<(), DomainError> {
        self.session.select_device(device_id)
    }

    /// Switch models and, on success, persist the choice.
    pub async fn select_model(&self, name: &str) -> Result<(), DomainError> {
        self.session.select_model(name).await?;
        if self.session.active_model().as_deref() == Some(name) {
            self.persist(|config| config.transcription.model = name.to_string());
        }
        Ok(())
    }

    /// Name of the currently loaded model, if any.
    pub fn active_model(&self) -> Option<String> {
        self.session.active_model()
    }

    /// Validate a hotkey choice against the supported set.
    pub fn validate_hotkey(name: &str) -> Result<(), DomainError> {
        if ShortcutConfig::CHOICES.contains(&name) {
            Ok(())
        } else {
            Err(DomainError::Hotkey(format!(
                "unsupported hotkey: {}",
                name
            )))
        }
    }

    /// Persist a new toggle hotkey. The caller re-registers the global
    /// shortcut; this only records the choice.
    pub fn set_hotkey(&self, name: &str) -> Result<(), DomainError> {
        Self::validate_hotkey(name)?;
        self.persist(|config| config.shortcut.toggle_hotkey = name.to_string());
        Ok(())
    }

    /// Currently configured toggle hotkey.
    pub fn hotkey(&self) -> String {
        self.config.read().shortcut.toggle_hotkey.clone()
    }

    /// The model catalog.
    pub fn model_catalog(&self) -> ModelCatalog {
        self.models.catalog().clone()
    }

    /// Models present on disk.
    pub fn list_installed_models(&self) -> Result<Vec<InstalledModel>, DomainError> {
        self.models.list_installed()
    }

    /// Download a model's weights without switching to it.
    pub async fn download_model(&self, name: &str) -> Result<(), DomainError> {
        self.models.ensure(name).await.map(|_| ())
    }

    /// Delete a downloaded model from disk.
    pub fn delete_model(&self, name: &str) -> Result<(), DomainError> {
        self.models.delete(name)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        self.config_store.data_dir()
    }

    /// Get the logs directory path.
    pub fn logs_dir(&self) -> PathBuf {
        self.config_store.logs_dir()
    }

    /// Get the config file path.
    pub fn config_path(&self) -> PathBuf {
        self.config_store.config_path()
    }

    fn persist<F: FnOnce(&mut AppConfig)>(&self, update: F) {
        let mut config = self.config.write();
        update(&mut config);
        if let Err(e) = self.config_store.save(&config) {
            warn!(error = %e, "failed to persist configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hotkey() {
        assert!(AppController::validate_hotkey("CapsLock").is_ok());
        assert!(AppController::validate_hotkey("F3").is_ok());
        assert!(matches!(
            AppController::validate_hotkey("Q"),
            Err(DomainError::Hotkey(_))
        ));
        assert!(matches!(
            AppController::validate_hotkey(""),
            Err(DomainError::Hotkey(_))
        ));
    }
}
