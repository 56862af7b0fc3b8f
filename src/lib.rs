//! # pdf-thumbnailer
//!
//! Generate a PNG thumbnail of the first page of every PDF in a directory
//! tree.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source dir
//!  │
//!  ├─ 1. Scan      walk the tree, keep *.pdf (walkdir, spawn_blocking)
//!  ├─ 2. Plan      one RenderTask per file, flag output-name collisions
//!  ├─ 3. Dispatch  one tokio task per file, optional worker cap
//!  ├─ 4. Render    page one via pdfium (spawn_blocking)
//!  ├─ 5. Write     PNG into the destination, atomic rename
//!  └─ 6. Report    per-file results + scan issues + stats
//! ```
//!
//! A failure on one file is recorded in the [`RunReport`] and never stops the
//! others. [`generate`] returns only after every file has settled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_thumbnailer::{generate, ThumbnailConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ThumbnailConfig::builder()
//!         .source_dir("/srv/docs")
//!         .destination("/srv/thumbs")
//!         .build()?;
//!     let report = generate(&config).await?;
//!     eprintln!("{}/{} thumbnails written",
//!         report.stats.succeeded,
//!         report.stats.discovered);
//!     for failed in report.failures() {
//!         eprintln!("{}: {:?}", failed.source.display(), failed.error);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-thumbnailer` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## PDFium
//!
//! Rendering needs a pdfium shared library at run time. Pass its location via
//! [`ThumbnailConfig::pdfium_library`]; otherwise the platform library in the
//! working directory and then the system library are used.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ThumbnailConfig, ThumbnailConfigBuilder};
pub use error::{FileError, RenderError, ThumbnailError, WriteError};
pub use generate::{generate, generate_sync, generate_with};
pub use pipeline::barrier::{CompletionBarrier, CompletionGuard};
pub use pipeline::dispatch::{dispatch, plan_tasks, DispatchOptions, RenderTask};
pub use pipeline::render::{PageRenderer, PdfiumRenderer, RenderSettings, RenderedImage};
pub use pipeline::scan::{scan, PdfFileSet, ScanIssue, ScanOptions};
pub use pipeline::write::write_thumbnail;
pub use progress::{NoopProgressCallback, ProgressCallback, ThumbnailProgressCallback};
pub use report::{OutputCollision, RunReport, RunStats, ThumbnailResult};
