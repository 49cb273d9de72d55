use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("PDF not found: {0}")]
    OpenNotFound(PathBuf),

    #[error("Failed to open PDF {path}: {reason}")]
    OpenCorrupt { path: PathBuf, reason: String },

    #[error("No pages found in the PDF document: {0}")]
    OpenEmpty(PathBuf),

    #[error("Failed to write PDF to {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("External viewer not found at {0}")]
    ExternalToolMissing(PathBuf),

    #[error("{tool} exited with status {}", code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ExternalToolFailure { tool: PathBuf, code: Option<i32> },

    #[error("Failed to launch {tool}: {source}")]
    ExternalToolLaunch {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page dimensions are invalid: {width} x {height}")]
    InvalidPageGeometry { width: f32, height: f32 },

    #[error("No document is open")]
    NoDocument,

    #[error("Malformed PDF structure: {0}")]
    Structure(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No control bound to field '{0}'")]
    UnknownControl(String),

    #[error("Field '{name}' is a {actual} control, not a {expected} control")]
    ControlMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl FormError {
    /// True for the errors raised while opening a document.
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            FormError::OpenNotFound(_) | FormError::OpenCorrupt { .. } | FormError::OpenEmpty(_)
        )
    }
}

impl From<lopdf::Error> for FormError {
    fn from(e: lopdf::Error) -> Self {
        FormError::Structure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
