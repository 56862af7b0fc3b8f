//! Tree scanning: collect every PDF below a source directory.
//!
//! Traversal uses `walkdir` with no depth bound. An error on the root is
//! fatal; an error anywhere below it (unreadable subdirectory, symlink loop)
//! is recorded as a [`ScanIssue`] and the walk carries on with the next
//! entry, so one bad subtree never hides the rest of the tree.

use crate::error::ThumbnailError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension identifying a PDF, without the dot.
pub const PDF_EXTENSION: &str = "pdf";

/// How the scanner matches and traverses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Accept `PDF`, `Pdf`, … in addition to `pdf`.
    pub ignore_case: bool,
    /// Descend into symlinked directories and accept symlinked files.
    pub follow_links: bool,
}

/// A subtree or entry the scanner could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanIssue {
    /// Entry that failed, when walkdir knows it.
    pub path: Option<PathBuf>,
    pub detail: String,
}

/// Result of one scan.
#[derive(Debug, Clone, Default)]
pub struct PdfFileSet {
    /// Discovered PDF files, sorted by file name within each directory.
    pub files: Vec<PathBuf>,
    /// Entries skipped because they could not be read.
    pub issues: Vec<ScanIssue>,
}

/// Whether `path` carries the PDF extension.
pub fn is_pdf(path: &Path, ignore_case: bool) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ignore_case => ext.eq_ignore_ascii_case(PDF_EXTENSION),
        Some(ext) => ext == PDF_EXTENSION,
        None => false,
    }
}

/// Recursively enumerate the PDF files under `root`.
///
/// # Errors
/// - [`ThumbnailError::NotADirectory`] if `root` is not a directory.
/// - [`ThumbnailError::ScanFailed`] if `root` cannot be read at all.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<PdfFileSet, ThumbnailError> {
    let mut set = PdfFileSet::default();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ThumbnailError::ScanFailed {
                    root: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                set.issues.push(ScanIssue {
                    path: e.path().map(Path::to_path_buf),
                    detail: e.to_string(),
                });
                continue;
            }
        };

        if entry.depth() == 0 {
            if !entry.file_type().is_dir() {
                return Err(ThumbnailError::NotADirectory {
                    role: "source path",
                    path: root.to_path_buf(),
                });
            }
            continue;
        }

        if entry.file_type().is_file() && is_pdf(entry.path(), options.ignore_case) {
            debug!("Found PDF: {}", entry.path().display());
            set.files.push(entry.into_path());
        }
    }

    info!(
        "Scanned {}: {} PDFs, {} unreadable entries",
        root.display(),
        set.files.len(),
        set.issues.len()
    );
    Ok(set)
}
