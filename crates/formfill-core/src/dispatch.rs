//! Output actions: save, print and open in an external viewer
//!
//! Every action first copies the controls back into the document and
//! re-stamps it. Printing goes through a temporary file that is removed on
//! every exit path; opening externally keeps its temporary file so the viewer
//! can hold it open.

use crate::binder::Bindings;
use crate::config::{FormConfig, ViewerConfig};
use crate::error::{FormError, Result};
use crate::session::Document;
use crate::stamp::{Clock, Stamper, SystemClock};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Runs the external viewer.
pub trait Launcher {
    /// Run to completion. `Ok(None)` means the process ended without an exit
    /// code (killed by a signal).
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<Option<i32>>;

    /// Start without waiting.
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> io::Result<()>;
}

/// Launches real processes with `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<Option<i32>> {
        let status = Command::new(program).args(args).status()?;
        Ok(status.code())
    }

    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> io::Result<()> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}

pub struct Dispatcher<L = SystemLauncher, C = SystemClock> {
    viewer: ViewerConfig,
    stamper: Stamper,
    launcher: L,
    clock: C,
}

impl Dispatcher {
    pub fn new(config: &FormConfig) -> Self {
        Self::with_parts(
            config.viewer.clone(),
            Stamper::new(config.stamp.clone()),
            SystemLauncher,
            SystemClock,
        )
    }
}

impl<L: Launcher, C: Clock> Dispatcher<L, C> {
    pub fn with_parts(viewer: ViewerConfig, stamper: Stamper, launcher: L, clock: C) -> Self {
        Self {
            viewer,
            stamper,
            launcher,
            clock,
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn viewer(&self) -> &ViewerConfig {
        &self.viewer
    }

    /// Read the controls back, stamp, and write the document to `path`.
    pub fn save_as(
        &self,
        doc: &mut Document,
        bindings: &Bindings,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        self.prepare(doc, bindings)?;
        doc.save(path)?;
        tracing::info!("PDF saved to {}", path.display());
        Ok(())
    }

    /// Read the controls back, stamp, and send the document to the printer.
    ///
    /// Exit codes listed in the viewer's `benign_exit_codes` count as success.
    /// The temporary file is gone when this returns, whatever the outcome.
    pub fn print_document(&self, doc: &mut Document, bindings: &Bindings) -> Result<()> {
        self.prepare(doc, bindings)?;
        let temp = write_temp_pdf(doc)?;

        let result = self.run_print(temp.path());

        let temp_path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            tracing::warn!(
                "Failed to remove temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
        result
    }

    /// Read the controls back, stamp, and open the document in the viewer.
    ///
    /// The temporary file is left in place for the viewer; its path is
    /// returned.
    pub fn open_externally(&self, doc: &mut Document, bindings: &Bindings) -> Result<PathBuf> {
        self.prepare(doc, bindings)?;
        let temp = write_temp_pdf(doc)?;
        self.ensure_viewer()?;

        let (_, path) = temp.keep().map_err(|e| FormError::Write {
            path: e.file.path().to_path_buf(),
            reason: e.error.to_string(),
        })?;

        let args = with_file(&self.viewer.open_args, &path);
        if let Err(source) = self.launcher.spawn_detached(&self.viewer.path, &args) {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(
                    "Failed to remove temporary file {}: {}",
                    path.display(),
                    e
                );
            }
            return Err(FormError::ExternalToolLaunch {
                tool: self.viewer.path.clone(),
                source,
            });
        }

        tracing::info!("PDF opened in {}", self.viewer.path.display());
        Ok(path)
    }

    /// Copy control values into the document's fields.
    ///
    /// Returns how many controls matched a field; unmatched names are skipped.
    pub fn sync_fields(&self, doc: &mut Document, bindings: &Bindings) -> Result<usize> {
        let mut updated = 0;
        for (name, value) in bindings.read_back() {
            if doc.write_field(&name, &value)? {
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn prepare(&self, doc: &mut Document, bindings: &Bindings) -> Result<()> {
        self.sync_fields(doc, bindings)?;
        match self.stamper.stamp(doc, self.clock.now()) {
            Ok(_) => Ok(()),
            Err(e @ FormError::InvalidPageGeometry { .. }) => {
                tracing::warn!("Skipping timestamp: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn run_print(&self, file: &Path) -> Result<()> {
        self.ensure_viewer()?;

        let tool = &self.viewer.path;
        let args = with_file(&self.viewer.print_args, file);
        match self.launcher.run(tool, &args) {
            Ok(Some(0)) => {
                tracing::info!("PDF sent to printer successfully");
                Ok(())
            }
            Ok(Some(code)) if self.viewer.is_benign_exit(code) => {
                tracing::info!(
                    "PDF sent to printer successfully (ignoring exit status {} from {})",
                    code,
                    tool.display()
                );
                Ok(())
            }
            Ok(code) => Err(FormError::ExternalToolFailure {
                tool: tool.clone(),
                code,
            }),
            Err(source) => Err(FormError::ExternalToolLaunch {
                tool: tool.clone(),
                source,
            }),
        }
    }

    fn ensure_viewer(&self) -> Result<()> {
        if self.viewer.path.exists() {
            Ok(())
        } else {
            Err(FormError::ExternalToolMissing(self.viewer.path.clone()))
        }
    }
}

fn with_file(args: &[String], file: &Path) -> Vec<OsString> {
    args.iter()
        .map(OsString::from)
        .chain(std::iter::once(file.as_os_str().to_os_string()))
        .collect()
}

/// Serialize `doc` into a fresh `.pdf` temporary file.
fn write_temp_pdf(doc: &mut Document) -> Result<NamedTempFile> {
    let bytes = doc.to_bytes()?;
    let write_error = |e: io::Error| FormError::Write {
        path: std::env::temp_dir(),
        reason: e.to_string(),
    };

    let mut temp_file = tempfile::Builder::new()
        .prefix("formfill-")
        .suffix(".pdf")
        .tempfile()
        .map_err(write_error)?;
    temp_file.write_all(&bytes).map_err(write_error)?;
    temp_file.flush().map_err(write_error)?;

    Ok(temp_file)
}
