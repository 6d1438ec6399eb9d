pub mod capture_cpal;
pub mod clipboard;
pub mod config_store;
pub mod model_store;
pub mod whisper;

pub use capture_cpal::CpalCapture;
pub use clipboard::ArboardClipboard;
pub use config_store::TomlConfigStore;
pub use model_store::LocalModelStore;
pub use whisper::WhisperTranscriber;
