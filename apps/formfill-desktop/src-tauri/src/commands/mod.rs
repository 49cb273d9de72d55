//! Tauri commands for the form filler window.
//!
//! Every command locks the shared [`AppState`](crate::state::AppState) for its
//! duration and reports failures to the frontend as plain strings.

pub mod file_dialogs;
pub mod form;
pub mod output;

use crate::state::AppState;
use std::sync::{Mutex, MutexGuard};

pub type SharedState = Mutex<AppState>;

pub(crate) fn lock(state: &SharedState) -> Result<MutexGuard<'_, AppState>, String> {
    state
        .lock()
        .map_err(|_| "Application state is unavailable; please restart".to_string())
}

/// Log an action failure and turn it into a message for the frontend.
pub(crate) fn report(action: &str, error: impl std::fmt::Display) -> String {
    tracing::error!("{} failed: {}", action, error);
    format!("{} failed: {}", action, error)
}
