//! Error types for the pdf-thumbnailer library.
//!
//! Two tiers of failure exist:
//!
//! * [`ThumbnailError`] — **Fatal**: the run cannot start or cannot continue
//!   (bad arguments, unreadable source root, pdfium not available). Returned
//!   as `Err(ThumbnailError)` from the top-level `generate*` functions.
//!
//! * [`FileError`] — **Non-fatal**: one PDF could not be turned into a
//!   thumbnail. Stored inside [`crate::report::ThumbnailResult`] so a single
//!   corrupt file never costs the rest of the batch.
//!
//! [`RenderError`] and [`WriteError`] are the typed failures of the render
//! adapter and the output writer; the dispatcher folds them into
//! [`FileError`] once a task settles.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-thumbnailer library.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    // ── Argument errors ───────────────────────────────────────────────────
    /// A required argument was supplied but empty.
    #[error("Provide a non-empty value for --{name}")]
    EmptyArgument { name: &'static str },

    /// A directory argument does not exist.
    #[error("The {role} '{path}' does not exist")]
    NotFound { role: &'static str, path: PathBuf },

    /// A directory argument exists but is not a directory.
    #[error("The {role} '{path}' is not a directory")]
    NotADirectory { role: &'static str, path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Scan errors ───────────────────────────────────────────────────────
    /// The source root itself could not be traversed.
    #[error("Failed to scan '{root}': {source}")]
    ScanFailed {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Point --pdfium-lib (or PDFIUM_LIB_PATH) at libpdfium, or place the platform\n\
library next to the binary. Pre-built libraries are available from\n\
https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Run outcome ───────────────────────────────────────────────────────
    /// Some files were thumbnailed but at least one failed.
    ///
    /// Returned by [`crate::report::RunReport::into_result`] when the caller
    /// wants to treat any per-file failure as an error.
    #[error("{failed}/{total} thumbnails failed")]
    PartialFailure { failed: usize, total: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of the render adapter for one document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// pdfium could not load the file (not a PDF, truncated, corrupt).
    #[error("cannot open '{path}': {detail}")]
    Open { path: PathBuf, detail: String },

    /// The document is encrypted and no password was configured.
    #[error("'{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    /// A password was configured but pdfium rejected it.
    #[error("wrong password for '{path}'")]
    WrongPassword { path: PathBuf },

    /// The requested page does not exist (includes zero-page documents).
    #[error("'{path}' has no page at index {index} ({total} pages)")]
    NoPage {
        path: PathBuf,
        index: u16,
        total: u16,
    },

    /// pdfium failed while rasterising the page.
    #[error("rasterisation of page {index} of '{path}' failed: {detail}")]
    Rasterise {
        path: PathBuf,
        index: u16,
        detail: String,
    },
}

/// Failure of the output writer for one thumbnail.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The destination file could not be created.
    #[error("cannot create thumbnail in '{dir}': {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding or flushing the encoded bytes failed.
    #[error("cannot encode '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The finished file could not be moved into place.
    #[error("cannot write '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal error for a single file.
///
/// Stored alongside [`crate::report::ThumbnailResult`] when a file fails.
/// The run continues with every other file regardless.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FileError {
    /// The document could not be opened or its first page rasterised.
    #[error("render failed: {0}")]
    Render(String),

    /// The thumbnail could not be encoded or written.
    #[error("write failed: {0}")]
    Write(String),

    /// The unit of work died before producing a result.
    #[error("task aborted: {0}")]
    Aborted(String),
}

impl From<RenderError> for FileError {
    fn from(e: RenderError) -> Self {
        FileError::Render(e.to_string())
    }
}

impl From<WriteError> for FileError {
    fn from(e: WriteError) -> Self {
        FileError::Write(e.to_string())
    }
}
