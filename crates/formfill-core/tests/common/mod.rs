//! Shared helpers for integration tests.

#![allow(dead_code)]

#[path = "../../src/testing.rs"]
mod testing;

pub use testing::{blank_pdf, form_pdf, pageless_pdf, FixtureField};

use std::path::{Path, PathBuf};

/// Write the stock listing template into `dir` and return its path.
pub fn write_listing_template(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{}.pdf", name));
    std::fs::write(
        &path,
        form_pdf(&[
            FixtureField::Text("Item Title", ""),
            FixtureField::Text("SKU", ""),
            FixtureField::Checkbox("Tested", "Off"),
            FixtureField::Choice("Condition", "New", &["New", "Used", "Parts & Repair"]),
            FixtureField::Text("Notes", ""),
            FixtureField::Signature("Approved By"),
        ]),
    )
    .unwrap();
    path
}
