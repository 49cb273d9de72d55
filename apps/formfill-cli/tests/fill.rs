//! `fill` against real template files.

#[allow(dead_code)]
#[path = "../../../crates/formfill-core/src/testing.rs"]
mod testing;

use formfill_cli::{fill, Output};
use formfill_core::{Document, FormConfig};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use testing::{form_pdf, FixtureField};

fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("listing.pdf");
    std::fs::write(
        &path,
        form_pdf(&[
            FixtureField::Text("Item Title", ""),
            FixtureField::Checkbox("Tested", "Off"),
            FixtureField::Choice("Condition", "New", &["New", "Used", "Parts & Repair"]),
            FixtureField::Text("Notes", "keep me"),
        ]),
    )
    .unwrap();
    path
}

fn set(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

#[test]
fn test_fill_to_file_applies_every_control_kind() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let out = dir.path().join("Widget A.pdf");

    let written = fill(
        &FormConfig::default(),
        &template,
        &[
            set("Item Title", "Widget A"),
            set("Tested", "yes"),
            set("Condition", "Parts & Repair"),
        ],
        &Output::File(out.clone()),
    )
    .unwrap();
    assert_eq!(written, Some(out.clone()));

    let saved = Document::open(&out).unwrap();
    let values: Vec<(String, String)> = saved
        .fields()
        .into_iter()
        .map(|f| (f.name, f.value))
        .collect();
    assert_eq!(
        values,
        vec![
            set("Item Title", "Widget A"),
            set("Tested", "Yes"),
            set("Condition", "Parts & Repair"),
            set("Notes", "keep me"),
        ]
    );
    assert_eq!(saved.annotations_titled("timestamp").len(), 1);

    // The template is left as it was.
    let original = Document::open(&template).unwrap();
    assert_eq!(original.fields()[0].value, "");
}

#[test]
fn test_fill_unchecks_with_falsy_value() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let out = dir.path().join("out.pdf");

    fill(
        &FormConfig::default(),
        &template,
        &[set("Tested", "no")],
        &Output::File(out.clone()),
    )
    .unwrap();

    let saved = Document::open(&out).unwrap();
    assert_eq!(saved.fields()[1].value, "Off");
}

#[test]
fn test_fill_unknown_field_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let out = dir.path().join("out.pdf");

    let err = fill(
        &FormConfig::default(),
        &template,
        &[set("Serial Number", "SN-1")],
        &Output::File(out.clone()),
    )
    .unwrap_err();

    assert!(err.to_string().contains("Serial Number"));
    assert!(!out.exists());
}
