//! Headless form filling
//!
//! Helpers behind the `formfill` binary: resolving templates, turning
//! `NAME=VALUE` assignments into binder edits, and dispatching the result.

use anyhow::{bail, Context, Result};
use formfill_core::binder::is_checked_value;
use formfill_core::{
    load_form, Bindings, Control, ControlInput, Dispatcher, FormConfig, Session, Templates,
};
use std::path::{Path, PathBuf};

/// Where a filled form goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    File(PathBuf),
    Print,
    Open,
}

/// Parse `NAME=VALUE`. The name is everything before the first `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if name.is_empty() {
        return Err(format!("empty field name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

/// The edit a raw string value makes to `control`.
pub fn input_for(control: &Control, value: &str) -> ControlInput {
    match control {
        Control::Checkbox { .. } => ControlInput::Checked(is_checked_value(value)),
        Control::Choice { .. } => ControlInput::Select(value.to_string()),
        _ => ControlInput::Text(value.to_string()),
    }
}

pub fn apply_assignments(bindings: &mut Bindings, assignments: &[(String, String)]) -> Result<()> {
    for (name, value) in assignments {
        let input = match bindings.get(name) {
            Some(control) => input_for(control, value),
            None => bail!("Template has no field named '{}'", name),
        };
        bindings
            .apply(name, input)
            .with_context(|| format!("Cannot set '{}'", name))?;
        tracing::debug!("Set '{}' = '{}'", name, value);
    }
    Ok(())
}

/// Find a template by registry name, falling back to a literal path.
pub fn resolve_template(templates: &Templates, template: &str) -> Result<PathBuf> {
    if let Some(path) = templates.get(template) {
        return Ok(path.to_path_buf());
    }
    let path = Path::new(template);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    bail!(
        "Unknown template '{}' (available: {})",
        template,
        templates.names().collect::<Vec<_>>().join(", ")
    )
}

/// One line per field: name, kind, value, bound control.
pub fn describe_fields(
    session: &mut Session,
    path: &Path,
    config: &FormConfig,
) -> Result<Vec<String>> {
    let bindings = load_form(session, path, &config.binder)?;
    let document = session.current_mut()?;

    Ok(document
        .fields()
        .iter()
        .map(|field| {
            let control = bindings
                .get(&field.name)
                .map(Control::type_name)
                .unwrap_or("none");
            format!("{}\t{}\t{}\t{}", field.name, field.kind, field.value, control)
        })
        .collect())
}

/// Bind `template`, apply the edits, and send it to `output`.
///
/// Returns the path of the written file, if any.
pub fn fill(
    config: &FormConfig,
    template: &Path,
    assignments: &[(String, String)],
    output: &Output,
) -> Result<Option<PathBuf>> {
    let mut session = Session::new();
    let mut bindings = load_form(&mut session, template, &config.binder)
        .with_context(|| format!("Failed to load template {}", template.display()))?;
    apply_assignments(&mut bindings, assignments)?;

    let dispatcher = Dispatcher::new(config);
    let document = session.current_mut()?;

    match output {
        Output::File(path) => {
            dispatcher.save_as(document, &bindings, path)?;
            Ok(Some(path.clone()))
        }
        Output::Print => {
            dispatcher.print_document(document, &bindings)?;
            Ok(None)
        }
        Output::Open => Ok(Some(dispatcher.open_externally(document, &bindings)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Item Title=Widget A"),
            Ok(("Item Title".to_string(), "Widget A".to_string()))
        );
        assert_eq!(
            parse_assignment("Notes=a=b"),
            Ok(("Notes".to_string(), "a=b".to_string()))
        );
        assert_eq!(
            parse_assignment("Notes="),
            Ok(("Notes".to_string(), String::new()))
        );
        assert!(parse_assignment("Notes").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_input_for_each_control() {
        let checkbox = Control::Checkbox { checked: false };
        assert_eq!(input_for(&checkbox, "yes"), ControlInput::Checked(true));
        assert_eq!(input_for(&checkbox, "no"), ControlInput::Checked(false));

        let choice = Control::Choice {
            options: vec!["New".to_string(), "Used".to_string()],
            selected: None,
            seed: String::new(),
        };
        assert_eq!(
            input_for(&choice, "Used"),
            ControlInput::Select("Used".to_string())
        );

        let text = Control::SingleLine {
            text: String::new(),
        };
        assert_eq!(input_for(&text, "x"), ControlInput::Text("x".to_string()));
    }

    #[test]
    fn test_resolve_template_by_name_or_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PC_Spec.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();
        let templates = Templates::scan(dir.path());

        assert_eq!(resolve_template(&templates, "PC_Spec").unwrap(), path);
        assert_eq!(
            resolve_template(&templates, path.to_str().unwrap()).unwrap(),
            path
        );
        let err = resolve_template(&templates, "Missing").unwrap_err();
        assert!(err.to_string().contains("PC_Spec"));
    }

    #[test]
    fn test_fill_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = fill(
            &FormConfig::default(),
            &dir.path().join("missing.pdf"),
            &[],
            &Output::Print,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to load template"));
    }
}
