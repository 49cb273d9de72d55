//! Template discovery
//!
//! Scans a directory for PDF templates and maps each file stem to its path.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A template PDF available for filling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    pub path: PathBuf,
}

/// Name-to-path mapping of the templates found at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Templates {
    entries: BTreeMap<String, PathBuf>,
}

impl Templates {
    /// Scan `dir` for `.pdf` files (case-insensitive extension).
    ///
    /// A directory that is missing or unreadable yields an empty registry.
    pub fn scan(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut entries = BTreeMap::new();

        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                tracing::debug!("Template directory {} not readable: {}", dir.display(), e);
                return Self { entries };
            }
        };

        for entry in read_dir.flatten() {
            let path = entry.path();
            if !path.is_file() || !has_pdf_extension(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.insert(stem.to_string(), path);
            }
        }

        tracing::info!("Found {} templates in {}", entries.len(), dir.display());
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The template loaded when the app starts.
    pub fn first(&self) -> Option<Template> {
        self.iter().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = Template> + '_ {
        self.entries.iter().map(|(name, path)| Template {
            name: name.clone(),
            path: path.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
