use tauri::{AppHandle, State};
use tauri_plugin_global_shortcut::GlobalShortcutExt;
use tracing::info;

use crate::app::AppController;
use crate::domain::config::ShortcutConfig;
use crate::domain::{AppConfig, AudioDevice, DomainError, SessionState};

/// The toggle trigger from the shell's record button.
/// The global hotkey lands in the same controller entry point.
#[tauri::command]
pub async fn toggle(controller: State<'_, AppController>) -> Result<(), String> {
    controller.toggle().await.map_err(|e| e.to_string())
}

/// Get the current session state.
#[tauri::command]
pub fn session_state(controller: State<'_, AppController>) -> SessionState {
    controller.session_state()
}

// ==================== Device Commands ====================

/// List available audio input devices.
#[tauri::command]
pub fn list_devices(controller: State<'_, AppController>) -> Result<Vec<AudioDevice>, String> {
    controller.list_devices().map_err(|e| e.to_string())
}

/// Select the input device used by the next recording.
#[tauri::command]
pub fn select_device(
    controller: State<'_, AppController>,
    device_id: String,
) -> Result<(), String> {
    controller
        .select_device(&device_id)
        .map_err(|e| e.to_string())
}

// ==================== Model Commands ====================

/// One row in the shell's model picker.
#[derive(serde::Serialize)]
pub struct ModelListing {
    pub name: String,
    pub description: String,
    pub size_mib: u64,
    pub installed: bool,
    pub active: bool,
}

/// List catalog models with installation/active status.
#[tauri::command]
pub fn list_models(controller: State<'_, AppController>) -> Result<Vec<ModelListing>, String> {
    let installed = controller
        .list_installed_models()
        .map_err(|e| e.to_string())?;
    let active = controller.active_model();

    let listings = controller
        .model_catalog()
        .models
        .into_iter()
        .map(|entry| ModelListing {
            installed: installed.iter().any(|m| m.name == entry.name),
            active: active.as_deref() == Some(entry.name.as_str()),
            name: entry.name,
            description: entry.description,
            size_mib: entry.size_mib,
        })
        .collect();

    Ok(listings)
}

/// Switch to a different model, downloading it first if needed.
#[tauri::command]
pub async fn select_model(
    controller: State<'_, AppController>,
    name: String,
) -> Result<(), String> {
    controller.select_model(&name).await.map_err(|e| e.to_string())
}

/// Download a model without making it active.
#[tauri::command]
pub async fn download_model(
    controller: State<'_, AppController>,
    name: String,
) -> Result<(), String> {
    controller.download_model(&name).await.map_err(|e| e.to_string())
}

/// Delete a downloaded model from disk.
#[tauri::command]
pub fn delete_model(controller: State<'_, AppController>, name: String) -> Result<(), String> {
    controller.delete_model(&name).map_err(|e| e.to_string())
}

// ==================== Hotkey Commands ====================

/// Current hotkey and the supported choices, for the shell's picker.
#[derive(serde::Serialize)]
pub struct HotkeyInfo {
    pub current: String,
    pub choices: Vec<&'static str>,
}

/// Get the toggle hotkey and the pickable alternatives.
#[tauri::command]
pub fn hotkey_info(controller: State<'_, AppController>) -> HotkeyInfo {
    HotkeyInfo {
        current: controller.hotkey(),
        choices: ShortcutConfig::CHOICES.to_vec(),
    }
}

/// Change the global toggle hotkey: register the new key, release the old
/// one, persist the choice. On registration failure the old key stays active.
#[tauri::command]
pub fn select_hotkey(
    app: AppHandle,
    controller: State<'_, AppController>,
    name: String,
) -> Result<(), String> {
    AppController::validate_hotkey(&name).map_err(|e| e.to_string())?;

    let previous = controller.hotkey();
    if previous == name {
        return Ok(());
    }

    let shortcuts = app.global_shortcut();
    shortcuts
        .register(name.as_str())
        .map_err(|e| DomainError::Hotkey(e.to_string()).to_string())?;

    if let Err(e) = shortcuts.unregister(previous.as_str()) {
        // The old registration may already be gone; not worth failing over.
        info!(hotkey = %previous, error = %e, "could not unregister previous hotkey");
    }

    controller.set_hotkey(&name).map_err(|e| e.to_string())?;
    info!(hotkey = %name, "toggle hotkey changed");
    Ok(())
}

// ==================== Config Commands ====================

/// Get the current application configuration.
#[tauri::command]
pub fn get_config(controller: State<'_, AppController>) -> AppConfig {
    controller.config()
}

/// Application paths information.
#[derive(serde::Serialize)]
pub struct AppPaths {
    pub data_dir: String,
    pub logs_dir: String,
    pub config_path: String,
}

/// Get application paths information.
#[tauri::command]
pub fn get_paths(controller: State<'_, AppController>) -> AppPaths {
    AppPaths {
        data_dir: controller.data_dir().to_string_lossy().to_string(),
        logs_dir: controller.logs_dir().to_string_lossy().to_string(),
        config_path: controller.config_path().to_string_lossy().to_string(),
    }
}
