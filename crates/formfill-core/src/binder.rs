//! Field-to-control binding
//!
//! Each field on page 0 gets exactly one control, picked from the
//! [`BinderConfig`] table. Shells render the controls and push edits back
//! through [`Bindings`]; [`Bindings::read_back`] turns the controls into
//! field values again.

use crate::config::BinderConfig;
use crate::error::{FormError, Result};
use crate::session::{Field, FieldKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Values that start a checkbox checked, compared case-insensitively.
const CHECKED_VALUES: [&str; 3] = ["yes", "true", "on"];

/// True when a field value means "checked".
pub fn is_checked_value(value: &str) -> bool {
    CHECKED_VALUES
        .iter()
        .any(|v| value.eq_ignore_ascii_case(v))
}

/// An input control bound to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Control {
    SingleLine {
        text: String,
    },
    MultiLine {
        text: String,
        min_height: u32,
    },
    Checkbox {
        checked: bool,
    },
    Choice {
        options: Vec<String>,
        selected: Option<usize>,
        /// Field value at bind time, read back while nothing is selected
        seed: String,
    },
    /// Placeholder for field types the form cannot edit
    Unsupported {
        kind: FieldKind,
    },
}

impl Control {
    /// Pick and seed the control for `field`.
    pub fn for_field(field: &Field, config: &BinderConfig) -> Self {
        match field.kind {
            FieldKind::Text if config.is_multiline(&field.name) => Control::MultiLine {
                text: field.value.clone(),
                min_height: config.multiline_min_height,
            },
            FieldKind::Text => Control::SingleLine {
                text: field.value.clone(),
            },
            FieldKind::Checkbox => Control::Checkbox {
                checked: is_checked_value(&field.value),
            },
            kind => match config.choice_options(&field.name) {
                Some(options) => Control::Choice {
                    options: options.to_vec(),
                    selected: options.iter().position(|o| *o == field.value),
                    seed: field.value.clone(),
                },
                None => Control::Unsupported { kind },
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Control::SingleLine { .. } => "single_line",
            Control::MultiLine { .. } => "multi_line",
            Control::Checkbox { .. } => "checkbox",
            Control::Choice { .. } => "choice",
            Control::Unsupported { .. } => "unsupported",
        }
    }

    /// The field value this control represents, `None` for placeholders.
    pub fn value(&self) -> Option<String> {
        match self {
            Control::SingleLine { text } | Control::MultiLine { text, .. } => Some(text.clone()),
            Control::Checkbox { checked } => {
                Some(if *checked { "Yes" } else { "No" }.to_string())
            }
            Control::Choice {
                options,
                selected,
                seed,
            } => Some(
                selected
                    .and_then(|i| options.get(i))
                    .unwrap_or(seed)
                    .clone(),
            ),
            Control::Unsupported { .. } => None,
        }
    }

    /// Whether the control takes text entry (and so advances focus on submit).
    pub fn is_text(&self) -> bool {
        matches!(self, Control::SingleLine { .. } | Control::MultiLine { .. })
    }
}

/// An edit coming from a shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ControlInput {
    Text(String),
    Checked(bool),
    Select(String),
}

/// Controls keyed by field name, in field declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    controls: IndexMap<String, Control>,
}

impl Bindings {
    /// Build one control per field.
    ///
    /// A repeated field name replaces the earlier control but keeps its
    /// position.
    pub fn bind(fields: &[Field], config: &BinderConfig) -> Self {
        let mut controls = IndexMap::with_capacity(fields.len());
        for field in fields {
            let control = Control::for_field(field, config);
            if let Some(previous) = controls.insert(field.name.clone(), control) {
                tracing::debug!(
                    "Field '{}' declared twice; replacing {} control",
                    field.name,
                    previous.type_name()
                );
            }
        }
        Self { controls }
    }

    pub fn get(&self, name: &str) -> Option<&Control> {
        self.controls.get(name)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Control)> {
        self.controls.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn set_text(&mut self, name: &str, text: impl Into<String>) -> Result<()> {
        match self.control_mut(name)? {
            Control::SingleLine { text: current } | Control::MultiLine { text: current, .. } => {
                *current = text.into();
                Ok(())
            }
            other => Err(mismatch(name, "text", other)),
        }
    }

    pub fn set_checked(&mut self, name: &str, checked: bool) -> Result<()> {
        match self.control_mut(name)? {
            Control::Checkbox { checked: current } => {
                *current = checked;
                Ok(())
            }
            other => Err(mismatch(name, "checkbox", other)),
        }
    }

    /// Select the option labelled `label`; an unknown label clears the selection.
    pub fn select(&mut self, name: &str, label: &str) -> Result<()> {
        match self.control_mut(name)? {
            Control::Choice {
                options, selected, ..
            } => {
                *selected = options.iter().position(|o| o == label);
                Ok(())
            }
            other => Err(mismatch(name, "choice", other)),
        }
    }

    pub fn apply(&mut self, name: &str, input: ControlInput) -> Result<()> {
        match input {
            ControlInput::Text(text) => self.set_text(name, text),
            ControlInput::Checked(checked) => self.set_checked(name, checked),
            ControlInput::Select(label) => self.select(name, &label),
        }
    }

    /// Current values of every editable control, in declaration order.
    pub fn read_back(&self) -> Vec<(String, String)> {
        self.controls
            .iter()
            .filter_map(|(name, control)| control.value().map(|v| (name.clone(), v)))
            .collect()
    }

    /// The control after `name` in declaration order.
    pub fn next_focus(&self, name: &str) -> Option<&str> {
        let index = self.controls.get_index_of(name)?;
        self.controls
            .get_index(index + 1)
            .map(|(next, _)| next.as_str())
    }

    /// Serializable snapshot for shells.
    pub fn view(&self) -> FormView {
        FormView {
            controls: self
                .controls
                .iter()
                .map(|(name, control)| BoundControl {
                    name: name.clone(),
                    control: control.clone(),
                })
                .collect(),
        }
    }

    fn control_mut(&mut self, name: &str) -> Result<&mut Control> {
        self.controls
            .get_mut(name)
            .ok_or_else(|| FormError::UnknownControl(name.to_string()))
    }
}

fn mismatch(name: &str, expected: &'static str, actual: &Control) -> FormError {
    FormError::ControlMismatch {
        name: name.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundControl {
    pub name: String,
    #[serde(flatten)]
    pub control: Control,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormView {
    pub controls: Vec<BoundControl>,
}
