pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod session;

pub use audio::{AudioBuffer, AudioConfig, AudioDevice};
pub use config::AppConfig;
pub use error::DomainError;
pub use events::SessionEvent;
pub use model::{InstalledModel, ModelCatalog, ModelEntry};
pub use session::{AtomicSessionState, SessionState};
