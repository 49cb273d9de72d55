//! PDF form filler desktop application.
//!
//! The window lists the templates, shows one control per form field, and
//! offers Save, Print and Open Externally. All document handling lives in
//! `formfill-core`; this crate wires it to Tauri commands.

pub mod commands;
pub mod state;

use commands::{form, output};
use state::AppState;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Register all Tauri commands and run the application.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = state::load_config();
    let mut app_state = AppState::new(config);
    tracing::info!("Found {} template(s)", app_state.templates().len());
    app_state.open_default();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(Mutex::new(app_state))
        .invoke_handler(tauri::generate_handler![
            // Form commands
            form::list_templates,
            form::current_form,
            form::open_template,
            form::update_control,
            form::next_control,
            // Output commands
            output::save_form,
            output::print_form,
            output::open_form_externally,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
