pub mod audio;
pub mod config;
pub mod models;
pub mod output;
pub mod transcriber;

pub use audio::AudioCapture;
pub use config::ConfigStore;
pub use models::ModelStore;
pub use output::TextOutput;
pub use transcriber::{TranscribeOptions, Transcriber, Transcript};
