//! Configuration types for a thumbnail run.
//!
//! Every knob lives in [`ThumbnailConfig`], built once via
//! [`ThumbnailConfigBuilder`] and passed by reference into the scanner and
//! dispatcher. Nothing is read from ambient global state.

use crate::error::ThumbnailError;
use crate::pipeline::render::RenderSettings;
use crate::pipeline::scan::ScanOptions;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};

/// Lowest accepted rendering DPI.
pub const MIN_DPI: u32 = 72;
/// Highest accepted rendering DPI.
pub const MAX_DPI: u32 = 600;

/// Configuration for one thumbnail run.
///
/// # Example
/// ```rust
/// use pdf_thumbnailer::ThumbnailConfig;
///
/// let config = ThumbnailConfig::builder()
///     .source_dir("/srv/docs")
///     .destination("/srv/thumbs")
///     .concurrency(Some(4))
///     .dpi(96)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, Some(4));
/// ```
#[derive(Clone)]
pub struct ThumbnailConfig {
    /// Directory scanned recursively for PDF files.
    pub source_dir: PathBuf,

    /// Directory receiving one `<stem>.png` per discovered PDF.
    pub destination: PathBuf,

    /// Maximum number of files rendered at once. Default: number of CPUs.
    ///
    /// `None` launches every file immediately with no cap.
    pub concurrency: Option<usize>,

    /// Rendering DPI for page one. Range: 72–600. Default: 150.
    pub dpi: u32,

    /// Cap on either edge of the thumbnail, in pixels. Default: 2000.
    ///
    /// Applied after DPI scaling, preserving aspect ratio, so an A0 poster
    /// cannot allocate a gigantic bitmap.
    pub max_size: u32,

    /// Match `.PDF`, `.Pdf`, … as well as `.pdf`. Default: false.
    pub ignore_case: bool,

    /// Follow symbolic links while scanning. Default: false.
    pub follow_links: bool,

    /// User password tried on encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium library file, or a directory holding the platform
    /// library. When `None` the working directory and then the system
    /// library are tried.
    pub pdfium_library: Option<PathBuf>,

    /// Per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

/// Number of workers used when the caller does not choose one.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            destination: PathBuf::new(),
            concurrency: Some(default_concurrency()),
            dpi: 150,
            max_size: 2000,
            ignore_case: false,
            follow_links: false,
            password: None,
            pdfium_library: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ThumbnailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailConfig")
            .field("source_dir", &self.source_dir)
            .field("destination", &self.destination)
            .field("concurrency", &self.concurrency)
            .field("dpi", &self.dpi)
            .field("max_size", &self.max_size)
            .field("ignore_case", &self.ignore_case)
            .field("follow_links", &self.follow_links)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ThumbnailProgressCallback>"),
            )
            .finish()
    }
}

impl ThumbnailConfig {
    /// Create a new builder for `ThumbnailConfig`.
    pub fn builder() -> ThumbnailConfigBuilder {
        ThumbnailConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check that both directories exist and are directories.
    ///
    /// Runs before any processing so a bad argument never creates output.
    pub fn validate_paths(&self) -> Result<(), ThumbnailError> {
        check_dir("source path", &self.source_dir)?;
        check_dir("destination", &self.destination)?;
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            ignore_case: self.ignore_case,
            follow_links: self.follow_links,
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            dpi: self.dpi,
            max_size: self.max_size,
        }
    }
}

fn check_dir(role: &'static str, path: &Path) -> Result<(), ThumbnailError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ThumbnailError::NotADirectory {
            role,
            path: path.to_path_buf(),
        }),
        Err(_) => Err(ThumbnailError::NotFound {
            role,
            path: path.to_path_buf(),
        }),
    }
}

/// Builder for [`ThumbnailConfig`].
#[derive(Debug)]
pub struct ThumbnailConfigBuilder {
    config: ThumbnailConfig,
}

impl ThumbnailConfigBuilder {
    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.destination = dir.into();
        self
    }

    /// `None` or `Some(0)` removes the cap.
    pub fn concurrency(mut self, n: Option<usize>) -> Self {
        self.config.concurrency = n.filter(|&n| n > 0);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn max_size(mut self, px: u32) -> Self {
        self.config.max_size = px.max(16);
        self
    }

    pub fn ignore_case(mut self, v: bool) -> Self {
        self.config.ignore_case = v;
        self
    }

    pub fn follow_links(mut self, v: bool) -> Self {
        self.config.follow_links = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Only the shape of the values is checked here; whether the directories
    /// exist is checked by [`ThumbnailConfig::validate_paths`] at run time.
    pub fn build(self) -> Result<ThumbnailConfig, ThumbnailError> {
        let c = &self.config;
        if c.source_dir.as_os_str().is_empty() {
            return Err(ThumbnailError::EmptyArgument { name: "path" });
        }
        if c.destination.as_os_str().is_empty() {
            return Err(ThumbnailError::EmptyArgument {
                name: "destination",
            });
        }
        if c.dpi < MIN_DPI || c.dpi > MAX_DPI {
            return Err(ThumbnailError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        Ok(self.config)
    }
}
