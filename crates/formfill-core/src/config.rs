//! Configuration tables for the form filler
//!
//! Everything that used to be hardcoded per template (which text fields are
//! multi-line, which fields offer a fixed list of choices, where the stamp
//! goes, which viewer prints) lives here and is loaded from TOML. Every
//! section has defaults, so an empty file is a valid configuration.

use crate::error::{FormError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from `formfill.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormConfig {
    /// Directory scanned for template PDFs
    pub templates_dir: PathBuf,
    pub binder: BinderConfig,
    pub stamp: StampConfig,
    pub viewer: ViewerConfig,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            binder: BinderConfig::default(),
            stamp: StampConfig::default(),
            viewer: ViewerConfig::default(),
        }
    }
}

impl FormConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Config`] if the file cannot be read or the TOML is
    /// malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FormError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// ```
    /// use formfill_core::config::FormConfig;
    ///
    /// let config = FormConfig::from_toml(r#"
    ///     templates_dir = "forms"
    ///
    ///     [binder]
    ///     multiline_fields = ["Description"]
    /// "#).unwrap();
    /// assert_eq!(config.binder.multiline_fields, vec!["Description".to_string()]);
    /// ```
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FormError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the template directory.
    ///
    /// Absolute paths are returned unchanged. A relative path is looked up
    /// next to the running executable first, so a packaged app finds the
    /// templates shipped beside it, then against the current directory.
    pub fn resolve_templates_dir(&self) -> PathBuf {
        if self.templates_dir.is_absolute() {
            return self.templates_dir.clone();
        }

        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&self.templates_dir)));

        match beside_exe {
            Some(dir) if dir.is_dir() => dir,
            _ => self.templates_dir.clone(),
        }
    }
}

/// Which control each field gets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BinderConfig {
    /// Text fields rendered as multi-line controls
    pub multiline_fields: Vec<String>,
    /// Minimum height hint for multi-line controls, in pixels
    pub multiline_min_height: u32,
    /// Fields rendered as a fixed list of choices
    pub choices: Vec<ChoiceField>,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            multiline_fields: vec!["Item Title".to_string(), "Notes".to_string()],
            multiline_min_height: 100,
            choices: vec![ChoiceField {
                field: "Condition".to_string(),
                options: vec![
                    "New".to_string(),
                    "Used".to_string(),
                    "Parts & Repair".to_string(),
                ],
            }],
        }
    }
}

impl BinderConfig {
    pub fn is_multiline(&self, field_name: &str) -> bool {
        self.multiline_fields.iter().any(|f| f == field_name)
    }

    /// Options for a choice field, matched by exact name.
    pub fn choice_options(&self, field_name: &str) -> Option<&[String]> {
        self.choices
            .iter()
            .find(|c| c.field == field_name)
            .map(|c| c.options.as_slice())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceField {
    pub field: String,
    pub options: Vec<String>,
}

/// Placement and look of the generation timestamp.
///
/// Offsets are measured from the bottom-right corner of the page to the
/// top-left corner of the stamp box, so the stamp stays on the page whatever
/// its size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StampConfig {
    /// Annotation title used to find a previous stamp
    pub title: String,
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
    /// One of the standard 14 PDF fonts
    pub font: String,
    pub font_size: f32,
    /// RGB, each component in 0..=1
    pub color: [f32; 3],
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            title: "timestamp".to_string(),
            offset_x: 180.0,
            offset_y: 25.0,
            width: 100.0,
            height: 20.0,
            font: "Helvetica".to_string(),
            font_size: 10.0,
            color: [0.0, 0.0, 0.0],
        }
    }
}

/// External viewer used for printing and opening documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub path: PathBuf,
    /// Arguments placed before the file path when printing
    pub print_args: Vec<String>,
    /// Arguments placed before the file path when opening
    pub open_args: Vec<String>,
    /// Non-zero exit codes that still mean the job went through.
    ///
    /// Acrobat's `/t` mode exits with 1 after handing the job to the spooler.
    pub benign_exit_codes: Vec<i32>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(r"C:\Program Files\Adobe\Acrobat DC\Acrobat\Acrobat.exe"),
            print_args: vec!["/t".to_string()],
            open_args: Vec::new(),
            benign_exit_codes: vec![1],
        }
    }
}

impl ViewerConfig {
    pub fn is_benign_exit(&self, code: i32) -> bool {
        code == 0 || self.benign_exit_codes.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = FormConfig::from_toml("").unwrap();
        assert_eq!(config, FormConfig::default());
    }

    #[test]
    fn test_defaults_match_stock_templates() {
        let config = FormConfig::default();
        assert!(config.binder.is_multiline("Item Title"));
        assert!(config.binder.is_multiline("Notes"));
        assert!(!config.binder.is_multiline("Condition"));
        assert_eq!(
            config.binder.choice_options("Condition").unwrap(),
            &["New", "Used", "Parts & Repair"]
        );
        assert_eq!(config.viewer.print_args, vec!["/t"]);
        assert_eq!(config.stamp.title, "timestamp");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = FormConfig::from_toml(
            r#"
            [viewer]
            path = "/usr/bin/evince"
            print_args = ["--print"]

            [[binder.choices]]
            field = "Grade"
            options = ["A", "B"]
            "#,
        )
        .unwrap();

        assert_eq!(config.viewer.path, PathBuf::from("/usr/bin/evince"));
        assert_eq!(config.viewer.benign_exit_codes, vec![1]);
        assert_eq!(config.binder.choice_options("Grade").unwrap(), &["A", "B"]);
        assert!(config.binder.choice_options("Condition").is_none());
        assert_eq!(config.binder.multiline_min_height, 100);
        assert_eq!(config.stamp, StampConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = FormConfig::from_toml("templates_dir = [").unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = FormConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }

    #[test]
    fn test_benign_exit_codes() {
        let viewer = ViewerConfig::default();
        assert!(viewer.is_benign_exit(0));
        assert!(viewer.is_benign_exit(1));
        assert!(!viewer.is_benign_exit(2));
    }

    #[test]
    fn test_absolute_templates_dir_unchanged() {
        let dir = std::env::temp_dir();
        let config = FormConfig {
            templates_dir: dir.clone(),
            ..FormConfig::default()
        };
        assert_eq!(config.resolve_templates_dir(), dir);
    }
}
