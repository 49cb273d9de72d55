//! Save, print and open-externally actions.

use super::file_dialogs::pick_save_path;
use super::{lock, report, SharedState};
use tauri::State;

/// Ask for a destination and save the filled form there.
///
/// Returns the saved path, or `None` if the dialog was cancelled.
#[tauri::command]
pub async fn save_form(
    app: tauri::AppHandle,
    state: State<'_, SharedState>,
) -> Result<Option<String>, String> {
    let suggested = {
        let state = lock(&state)?;
        if !state.is_open() {
            return Err("No form is open".to_string());
        }
        state.suggested_file_name()
    };

    let Some(path) = pick_save_path(&app, &suggested)? else {
        return Ok(None);
    };

    lock(&state)?
        .save_to(&path)
        .map_err(|e| report("Saving", e))?;
    Ok(Some(path.to_string_lossy().to_string()))
}

/// Send the filled form to the configured viewer for printing and wait.
#[tauri::command]
pub async fn print_form(state: State<'_, SharedState>) -> Result<(), String> {
    lock(&state)?.print().map_err(|e| report("Printing", e))
}

/// Hand the filled form to the configured viewer without waiting.
#[tauri::command]
pub async fn open_form_externally(state: State<'_, SharedState>) -> Result<String, String> {
    let path = lock(&state)?
        .open_externally()
        .map_err(|e| report("Opening in viewer", e))?;
    Ok(path.to_string_lossy().to_string())
}
