#![forbid(unsafe_code)]

mod adapters;
mod app;
mod commands;
mod domain;
mod infrastructure;
mod ports;

use tauri::{Emitter, Manager};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use app::AppController;
use commands::{
    delete_model, download_model, get_config, get_paths, hotkey_info, list_devices, list_models,
    select_device, select_hotkey, select_model, session_state, toggle,
};

pub fn run() {
    // Only shell initialization is allowed to take the process down; every
    // later failure is reported through session events instead.
    let controller = match AppController::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    tauri::Builder::default()
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, _shortcut, event| {
                    if event.state() == ShortcutState::Pressed {
                        let session = app.state::<AppController>().session();
                        tauri::async_runtime::spawn(async move {
                            // Already reported as a session log event.
                            let _ = session.toggle().await;
                        });
                    }
                })
                .build(),
        )
        .manage(controller)
        .invoke_handler(tauri::generate_handler![
            toggle,
            session_state,
            list_devices,
            select_device,
            list_models,
            select_model,
            download_model,
            delete_model,
            hotkey_info,
            select_hotkey,
            get_config,
            get_paths,
        ])
        .setup(|app| {
            let controller = app.state::<AppController>();

            // Forward session events to the webview's log pane and pickers.
            let mut events = controller.subscribe();
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            let _ = handle.emit("session://event", &event);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "webview event forwarder lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            // Register the configured toggle hotkey.
            let hotkey = controller.hotkey();
            if let Err(e) = app.global_shortcut().register(hotkey.as_str()) {
                warn!(hotkey = %hotkey, error = %e, "failed to register global hotkey");
            }

            // Device scan and initial model load, off the event loop.
            let session = controller.session();
            let model = controller.config().transcription.model;
            tauri::async_runtime::spawn(async move {
                session.startup(&model).await;
            });

            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
