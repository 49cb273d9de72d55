//! Native save dialog for filled forms.

use std::path::{Path, PathBuf};
use tauri_plugin_dialog::DialogExt;

/// Longest file name offered in the dialog, in characters.
const MAX_FILE_NAME_CHARS: usize = 200;

/// Make a suggested file name safe to offer in a save dialog.
///
/// Path separators and characters Windows rejects become `_`, control
/// characters are dropped, and an empty result falls back to `form.pdf`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => Some('_'),
            '\0'..='\x1f' | '\x7f' => None,
            c => Some(c),
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    let limited = match trimmed.char_indices().nth(MAX_FILE_NAME_CHARS) {
        Some((end, _)) => &trimmed[..end],
        None => trimmed,
    };

    if limited.is_empty() {
        "form.pdf".to_string()
    } else {
        limited.to_string()
    }
}

/// Give `path` a `.pdf` extension unless it already has one (any case).
pub fn ensure_pdf_extension(path: &Path) -> PathBuf {
    let mut result = path.to_path_buf();
    let is_pdf = result
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        result.set_extension("pdf");
    }
    result
}

/// Ask where to save, starting in the user's Documents folder.
///
/// Returns `Ok(None)` when the user cancels.
pub fn pick_save_path(
    app: &tauri::AppHandle,
    suggested_name: &str,
) -> Result<Option<PathBuf>, String> {
    let default_dir = dirs::document_dir().unwrap_or_else(|| PathBuf::from("."));

    let picked = app
        .dialog()
        .file()
        .set_title("Save PDF")
        .add_filter("PDF Files", &["pdf", "PDF"])
        .set_directory(default_dir)
        .set_file_name(sanitize_filename(suggested_name))
        .blocking_save_file();

    match picked {
        Some(path) => {
            let path = path.into_path().map_err(|e| {
                format!("Could not access the save location. Please try again. ({})", e)
            })?;
            Ok(Some(ensure_pdf_extension(&path)))
        }
        // Cancelling is not an error
        None => Ok(None),
    }
}
