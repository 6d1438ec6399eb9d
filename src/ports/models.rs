use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{DomainError, InstalledModel, ModelCatalog};

/// Port for local model storage: catalog, downloads, and the models
/// directory on disk.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Get the model catalog.
    fn catalog(&self) -> &ModelCatalog;

    /// List all installed models.
    fn list_installed(&self) -> Result<Vec<InstalledModel>, DomainError>;

    /// Check if a model is installed.
    fn is_installed(&self, name: &str) -> bool;

    /// Get the path to an installed model, or None if not installed.
    fn model_path(&self, name: &str) -> Option<PathBuf>;

    /// Return the path to a model's weights, downloading them first if the
    /// model is known to the catalog but not yet on disk.
    async fn ensure(&self, name: &str) -> Result<PathBuf, DomainError>;

    /// Verify an installed model against its recorded integrity digest.
    fn verify(&self, name: &str) -> Result<bool, DomainError>;

    /// Delete an installed model.
    fn delete(&self, name: &str) -> Result<(), DomainError>;

    /// Get the models directory path.
    fn models_dir(&self) -> PathBuf;
}
