use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A Whisper model known to the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Model name as picked in the shell (e.g., "base").
    pub name: String,
    /// ggml file name on disk (e.g., "ggml-base.bin").
    pub filename: String,
    /// Download URL for the ggml weights.
    pub url: String,
    /// Approximate download size in MiB, for the picker.
    pub size_mib: u64,
    /// Short description shown next to the name.
    pub description: String,
}

/// Catalog of downloadable models, embedded at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    /// Catalog version for compatibility checking.
    pub version: u32,
    /// Available models, smallest first.
    pub models: Vec<ModelEntry>,
}

impl ModelCatalog {
    /// Find a model by name.
    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == name)
    }

    /// List all model names.
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}

/// A model present in the local models directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledModel {
    /// Model name.
    pub name: String,
    /// Path to the ggml file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ModelCatalog {
        ModelCatalog {
            version: 1,
            models: vec![
                ModelEntry {
                    name: "tiny".to_string(),
                    filename: "ggml-tiny.bin".to_string(),
                    url: "https://example.invalid/ggml-tiny.bin".to_string(),
                    size_mib: 75,
                    description: "fastest".to_string(),
                },
                ModelEntry {
                    name: "base".to_string(),
                    filename: "ggml-base.bin".to_string(),
                    url: "https://example.invalid/ggml-base.bin".to_string(),
                    size_mib: 142,
                    description: "default".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = catalog();
        assert!(catalog.get("base").is_some());
        assert!(catalog.get("huge").is_none());
        assert_eq!(catalog.model_names(), vec!["tiny", "base"]);
    }
}
