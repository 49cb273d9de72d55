//! PDF form filling
//!
//! This crate loads a PDF form template, binds each field on its first page
//! to an input control, and writes edited values back before saving,
//! printing, or opening the document in an external viewer. Every output is
//! stamped with its generation time.
//!
//! The flow a shell drives:
//! - [`Templates::scan`] finds the template PDFs
//! - [`Session::open`] loads one and [`Document::fields`] lists its fields
//! - [`Bindings::bind`] builds the controls, which the shell edits
//! - [`Dispatcher`] reads the controls back, stamps, and outputs

pub mod binder;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod session;
pub mod stamp;

#[cfg(test)]
mod testing;

pub use binder::{BoundControl, Bindings, Control, ControlInput, FormView};
pub use config::FormConfig;
pub use dispatch::{Dispatcher, Launcher, SystemLauncher};
pub use error::FormError;
pub use registry::{Template, Templates};
pub use session::{Document, Field, FieldKind, PageRect, Session};
pub use stamp::{format_timestamp, Clock, FixedClock, Stamper, SystemClock};

/// Open `path` in `session` and bind its fields.
pub fn load_form(
    session: &mut Session,
    path: impl AsRef<std::path::Path>,
    config: &config::BinderConfig,
) -> error::Result<Bindings> {
    let document = session.open(path)?;
    Ok(Bindings::bind(&document.fields(), config))
}
