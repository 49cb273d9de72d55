//! Template selection and control edits.

use super::{lock, report, SharedState};
use crate::state::FormSnapshot;
use formfill_core::{ControlInput, Template};
use tauri::State;

#[tauri::command]
pub fn list_templates(state: State<'_, SharedState>) -> Result<Vec<Template>, String> {
    let state = lock(&state)?;
    Ok(state.templates().iter().collect())
}

#[tauri::command]
pub fn current_form(state: State<'_, SharedState>) -> Result<FormSnapshot, String> {
    Ok(lock(&state)?.snapshot())
}

#[tauri::command]
pub fn open_template(
    name: String,
    state: State<'_, SharedState>,
) -> Result<FormSnapshot, String> {
    lock(&state)?
        .open_template(&name)
        .map_err(|e| report("Opening template", e))
}

#[tauri::command]
pub fn update_control(
    name: String,
    input: ControlInput,
    state: State<'_, SharedState>,
) -> Result<(), String> {
    lock(&state)?
        .update(&name, input)
        .map_err(|e| report("Updating field", e))
}

/// Name of the control that takes focus after `name` is submitted.
#[tauri::command]
pub fn next_control(
    name: String,
    state: State<'_, SharedState>,
) -> Result<Option<String>, String> {
    Ok(lock(&state)?.next_control(&name))
}
