use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, DomainError};
use crate::ports::ConfigStore;

/// TOML-based configuration store with OS-specific paths.
pub struct TomlConfigStore {
    data_dir: PathBuf,
}

impl TomlConfigStore {
    /// Create a new TomlConfigStore.
    /// Uses OS-specific application data directories.
    pub fn new() -> Result<Self, DomainError> {
        let data_dir = Self::get_data_dir()?;

        fs::create_dir_all(&data_dir)?;

        info!(data_dir = ?data_dir, "ConfigStore initialized");

        Ok(Self { data_dir })
    }

    /// Store rooted at an explicit directory, for tests.
    #[cfg(test)]
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Get the OS-specific application data directory.
    /// - macOS: ~/Library/Application Support/Dictapad/
    /// - Windows: %APPDATA%\Dictapad\
    /// - Linux: ~/.config/dictapad/
    fn get_data_dir() -> Result<PathBuf, DomainError> {
        #[cfg(target_os = "macos")]
        {
            dirs::data_dir().map(|p| p.join("Dictapad")).ok_or_else(|| {
                DomainError::Config("could not find application data directory".to_string())
            })
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|p| p.join("Dictapad")).ok_or_else(|| {
                DomainError::Config("could not find application data directory".to_string())
            })
        }

        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|p| p.join("dictapad")).ok_or_else(|| {
                DomainError::Config("could not find application data directory".to_string())
            })
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Err(DomainError::Config(
                "unsupported operating system".to_string(),
            ))
        }
    }

    /// Get the OS-specific log directory.
    fn get_logs_dir(&self) -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            self.data_dir.join("logs")
        }

        #[cfg(target_os = "windows")]
        {
            dirs::data_local_dir()
                .map(|p| p.join("Dictapad").join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }

        #[cfg(target_os = "linux")]
        {
            dirs::data_dir()
                .map(|p| p.join("dictapad").join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            self.data_dir.join("logs")
        }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, DomainError> {
        let config_path = self.config_path();

        if config_path.exists() {
            debug!(path = ?config_path, "loading configuration");
            let content = fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            info!(path = ?config_path, "configuration loaded");
            Ok(config)
        } else {
            info!(path = ?config_path, "configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), DomainError> {
        let config_path = self.config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&config_path, content)?;

        info!(path = ?config_path, "configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn logs_dir(&self) -> PathBuf {
        self.get_logs_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_store_paths() {
        let store = TomlConfigStore::with_data_dir(env::temp_dir().join("dictapad_paths_test"));

        let config_path = store.config_path();
        assert!(config_path.ends_with("config.toml"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = env::temp_dir().join("dictapad_config_test");
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).unwrap();

        let store = TomlConfigStore::with_data_dir(temp_dir.clone());

        let mut config = AppConfig::new();
        config.transcription.model = "small".to_string();
        config.shortcut.toggle_hotkey = "F2".to_string();

        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.transcription.model, "small");
        assert_eq!(loaded.shortcut.toggle_hotkey, "F2");

        let _ = fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn test_load_creates_default_when_missing() {
        let temp_dir = env::temp_dir().join("dictapad_default_test");
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).unwrap();

        let store = TomlConfigStore::with_data_dir(temp_dir.clone());
        let config = store.load().unwrap();

        assert_eq!(config.transcription.model, "base");
        assert!(store.config_path().exists());

        let _ = fs::remove_dir_all(&temp_dir);
    }
}
