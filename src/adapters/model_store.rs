use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::domain::{DomainError, InstalledModel, ModelCatalog, ModelEntry};
use crate::ports::ModelStore;

/// Embedded model catalog JSON.
const CATALOG_JSON: &str = include_str!("../../resources/model_catalog.json");

/// Filesystem-backed model store.
///
/// Models live as ggml files under `<data_dir>/models/`. Each download gets a
/// `.sha256` sidecar recorded at install time; `verify` detects on-disk
/// corruption against that record.
pub struct LocalModelStore {
    catalog: ModelCatalog,
    models_dir: PathBuf,
    installed: RwLock<Vec<InstalledModel>>,
    http: reqwest::Client,
}

impl LocalModelStore {
    /// Create a new store rooted at `<data_dir>/models`.
    pub fn new(data_dir: PathBuf) -> Result<Self, DomainError> {
        let catalog: ModelCatalog = serde_json::from_str(CATALOG_JSON)
            .map_err(|e| DomainError::Config(format!("failed to parse model catalog: {}", e)))?;

        let models_dir = data_dir.join("models");
        fs::create_dir_all(&models_dir)?;

        let store = Self {
            catalog,
            models_dir,
            installed: RwLock::new(Vec::new()),
            http: reqwest::Client::new(),
        };

        store.scan_installed()?;

        info!(
            models_dir = ?store.models_dir,
            catalog_version = store.catalog.version,
            installed_count = store.installed.read().len(),
            "LocalModelStore initialized"
        );

        Ok(store)
    }

    /// Scan the models directory for files matching catalog entries.
    fn scan_installed(&self) -> Result<(), DomainError> {
        let mut installed = self.installed.write();
        installed.clear();

        for entry in self.catalog.models.iter() {
            let path = self.models_dir.join(&entry.filename);
            if let Ok(meta) = fs::metadata(&path) {
                if meta.is_file() {
                    debug!(model = %entry.name, "found installed model");
                    installed.push(InstalledModel {
                        name: entry.name.clone(),
                        path,
                        size_bytes: meta.len(),
                    });
                }
            }
        }

        Ok(())
    }

    fn sidecar_path(&self, entry: &ModelEntry) -> PathBuf {
        self.models_dir.join(format!("{}.sha256", entry.filename))
    }

    /// Calculate SHA-256 hash of a file.
    fn calculate_sha256(path: &PathBuf) -> Result<String, DomainError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Sha256::new();

        let mut buffer = [0u8; 8192];
        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|e| DomainError::Io(e.to_string()))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Stream the model weights to disk, hashing as we go.
    /// Writes to a `.part` file and renames on completion so an interrupted
    /// download never masquerades as an installed model.
    async fn download(&self, entry: &ModelEntry) -> Result<InstalledModel, DomainError> {
        let target_path = self.models_dir.join(&entry.filename);
        let part_path = self.models_dir.join(format!("{}.part", entry.filename));

        info!(
            model = %entry.name,
            url = %entry.url,
            size_mib = entry.size_mib,
            "starting model download"
        );

        let response = self
            .http
            .get(&entry.url)
            .send()
            .await
            .map_err(|e| DomainError::ModelDownload(e.to_string()))?
            .error_for_status()
            .map_err(|e| DomainError::ModelDownload(e.to_string()))?;

        let total = response.content_length().unwrap_or(0);
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut last_logged_pct: u64 = 0;

        let mut part = File::create(&part_path)?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let _ = fs::remove_file(&part_path);
                    return Err(DomainError::ModelDownload(e.to_string()));
                }
            };
            hasher.update(&chunk);
            if let Err(e) = part.write_all(&chunk) {
                let _ = fs::remove_file(&part_path);
                return Err(DomainError::Io(e.to_string()));
            }

            downloaded += chunk.len() as u64;
            if total > 0 {
                let pct = downloaded * 100 / total;
                if pct >= last_logged_pct + 10 {
                    last_logged_pct = pct;
                    debug!(model = %entry.name, pct, "download progress");
                }
            }
        }
        part.flush()?;
        drop(part);

        fs::rename(&part_path, &target_path)?;

        // Record the digest we just computed; verify() checks against it.
        let digest = format!("{:x}", hasher.finalize());
        fs::write(self.sidecar_path(entry), &digest)?;

        let size = fs::metadata(&target_path)?.len();
        let installed = InstalledModel {
            name: entry.name.clone(),
            path: target_path,
            size_bytes: size,
        };

        self.installed.write().push(installed.clone());

        info!(
            model = %entry.name,
            size_mb = size / (1024 * 1024),
            "model installed"
        );

        Ok(installed)
    }
}

#[async_trait]
impl ModelStore for LocalModelStore {
    fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    fn list_installed(&self) -> Result<Vec<InstalledModel>, DomainError> {
        Ok(self.installed.read().clone())
    }

    fn is_installed(&self, name: &str) -> bool {
        self.installed.read().iter().any(|m| m.name == name)
    }

    fn model_path(&self, name: &str) -> Option<PathBuf> {
        self.installed
            .read()
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.path.clone())
    }

    async fn ensure(&self, name: &str) -> Result<PathBuf, DomainError> {
        if let Some(path) = self.model_path(name) {
            return Ok(path);
        }

        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| DomainError::ModelNotFound(name.to_string()))?
            .clone();

        let installed = self.download(&entry).await?;
        Ok(installed.path)
    }

    fn verify(&self, name: &str) -> Result<bool, DomainError> {
        let path = self
            .model_path(name)
            .ok_or_else(|| DomainError::ModelNotFound(name.to_string()))?;

        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| DomainError::ModelNotFound(name.to_string()))?;

        let sidecar = self.sidecar_path(entry);
        let actual = Self::calculate_sha256(&path)?;

        match fs::read_to_string(&sidecar) {
            Ok(recorded) => {
                let recorded = recorded.trim();
                let valid = recorded == actual;
                if !valid {
                    warn!(
                        model = %name,
                        expected = %recorded,
                        actual = %actual,
                        "model integrity check failed"
                    );
                }
                Ok(valid)
            }
            // No record yet (e.g. a hand-copied model file): adopt it.
            Err(_) => {
                fs::write(&sidecar, &actual)?;
                debug!(model = %name, "recorded integrity digest for existing model");
                Ok(true)
            }
        }
    }

    fn delete(&self, name: &str) -> Result<(), DomainError> {
        let path = self
            .model_path(name)
            .ok_or_else(|| DomainError::ModelNotFound(name.to_string()))?;

        fs::remove_file(&path)?;
        if let Some(entry) = self.catalog.get(name) {
            let _ = fs::remove_file(self.sidecar_path(entry));
        }

        self.installed.write().retain(|m| m.name != name);

        info!(model = %name, "model deleted");
        Ok(())
    }

    fn models_dir(&self) -> PathBuf {
        self.models_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_catalog_parsing() {
        let catalog: ModelCatalog = serde_json::from_str(CATALOG_JSON).unwrap();
        assert!(catalog.version >= 1);
        assert_eq!(
            catalog.model_names(),
            vec!["tiny", "base", "small", "medium", "large"]
        );
        assert!(catalog.get("base").unwrap().filename.ends_with(".bin"));
    }

    #[test]
    fn test_scan_and_delete() {
        let temp_dir = env::temp_dir().join("dictapad_model_test");
        let _ = fs::remove_dir_all(&temp_dir);

        let store = LocalModelStore::new(temp_dir.clone()).unwrap();
        assert!(!store.is_installed("base"));
        assert!(store.model_path("base").is_none());

        // Drop a fake model file in place and rescan.
        fs::write(store.models_dir().join("ggml-base.bin"), b"weights").unwrap();
        store.scan_installed().unwrap();
        assert!(store.is_installed("base"));

        store.delete("base").unwrap();
        assert!(!store.is_installed("base"));
        assert!(!store.models_dir().join("ggml-base.bin").exists());

        let _ = fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn test_verify_records_and_checks_digest() {
        let temp_dir = env::temp_dir().join("dictapad_verify_test");
        let _ = fs::remove_dir_all(&temp_dir);

        let store = LocalModelStore::new(temp_dir.clone()).unwrap();
        fs::write(store.models_dir().join("ggml-tiny.bin"), b"weights").unwrap();
        store.scan_installed().unwrap();

        // First verify adopts the file and records its digest.
        assert!(store.verify("tiny").unwrap());

        // Unchanged file still verifies.
        assert!(store.verify("tiny").unwrap());

        // Corrupt the file: verify must fail against the recorded digest.
        fs::write(store.models_dir().join("ggml-tiny.bin"), b"corrupted").unwrap();
        assert!(!store.verify("tiny").unwrap());

        let _ = fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn test_verify_missing_model() {
        let temp_dir = env::temp_dir().join("dictapad_verify_missing_test");
        let _ = fs::remove_dir_all(&temp_dir);

        let store = LocalModelStore::new(temp_dir.clone()).unwrap();
        assert!(matches!(
            store.verify("base"),
            Err(DomainError::ModelNotFound(_))
        ));

        let _ = fs::remove_dir_all(&temp_dir);
    }
}
