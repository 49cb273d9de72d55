//! Application state shared by every command.
//!
//! One template is open at a time. The controls shown in the window are the
//! [`Bindings`] kept here, rebuilt whenever a template is opened.

use formfill_core::error::Result;
use formfill_core::{
    load_form, Bindings, ControlInput, Dispatcher, FormConfig, FormError, FormView, Session,
    Templates,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Configuration file looked up beside the executable.
pub const CONFIG_FILE_NAME: &str = "formfill.toml";

/// Field whose value names the saved file, when present.
const TITLE_FIELD: &str = "Item Title";

/// Everything the frontend needs to redraw the form.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormSnapshot {
    pub template: Option<String>,
    #[serde(flatten)]
    pub view: FormView,
}

pub struct AppState {
    config: FormConfig,
    templates: Templates,
    session: Session,
    bindings: Bindings,
    template: Option<String>,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: FormConfig) -> Self {
        let templates = Templates::scan(config.resolve_templates_dir());
        Self::with_templates(config, templates)
    }

    pub fn with_templates(config: FormConfig, templates: Templates) -> Self {
        let dispatcher = Dispatcher::new(&config);
        Self {
            config,
            templates,
            session: Session::new(),
            bindings: Bindings::default(),
            template: None,
            dispatcher,
        }
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Open the first template, if there is one.
    pub fn open_default(&mut self) {
        let Some(first) = self.templates.first() else {
            tracing::warn!(
                "No PDF templates found in {}",
                self.config.resolve_templates_dir().display()
            );
            return;
        };
        if let Err(e) = self.open_template(&first.name) {
            tracing::error!("Failed to open default template '{}': {}", first.name, e);
        }
    }

    /// Open a template by name and rebind its controls.
    ///
    /// On failure the previous form stays open.
    pub fn open_template(&mut self, name: &str) -> Result<FormSnapshot> {
        let path = self
            .templates
            .get(name)
            .map(Path::to_path_buf)
            .ok_or_else(|| FormError::OpenNotFound(PathBuf::from(name)))?;

        self.bindings = load_form(&mut self.session, &path, &self.config.binder)?;
        self.template = Some(name.to_string());
        Ok(self.snapshot())
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            template: self.template.clone(),
            view: self.bindings.view(),
        }
    }

    pub fn update(&mut self, name: &str, input: ControlInput) -> Result<()> {
        self.bindings.apply(name, input)
    }

    pub fn next_control(&self, name: &str) -> Option<String> {
        self.bindings.next_focus(name).map(str::to_string)
    }

    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        let document = self.session.current_mut()?;
        self.dispatcher.save_as(document, &self.bindings, path)
    }

    pub fn print(&mut self) -> Result<()> {
        let document = self.session.current_mut()?;
        self.dispatcher.print_document(document, &self.bindings)
    }

    pub fn open_externally(&mut self) -> Result<PathBuf> {
        let document = self.session.current_mut()?;
        self.dispatcher.open_externally(document, &self.bindings)
    }

    /// File name offered in the save dialog: the item title if filled in,
    /// otherwise the template name.
    pub fn suggested_file_name(&self) -> String {
        let title = self
            .bindings
            .read_back()
            .into_iter()
            .find(|(name, value)| name == TITLE_FIELD && !value.trim().is_empty())
            .map(|(_, value)| value);

        match title.or_else(|| self.template.clone()) {
            Some(stem) => format!("{}.pdf", stem),
            None => "form.pdf".to_string(),
        }
    }
}

/// `formfill.toml` beside the executable, if it exists.
pub fn config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .filter(|path| path.is_file())
}

/// Load the configuration, falling back to defaults when it is unreadable.
pub fn load_config() -> FormConfig {
    let path = config_path();
    match FormConfig::load_or_default(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}; using defaults", e);
            FormConfig::default()
        }
    }
}
