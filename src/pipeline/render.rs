//! PDF rasterisation: render one page of a document via pdfium.
//!
//! The rest of the crate only sees [`PageRenderer`], so the dispatcher can be
//! driven by any backend (tests use an in-memory fake). [`PdfiumRenderer`]
//! is the production backend.
//!
//! pdfium is a blocking C++ library. Callers run [`PageRenderer::render_page`]
//! inside `tokio::task::spawn_blocking`; the `thread_safe` feature of
//! `pdfium-render` serialises the FFI calls behind a mutex, so one bound
//! instance can be shared by every worker.

use crate::error::{RenderError, ThumbnailError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page one, the only page this crate ever asks for.
pub const FIRST_PAGE: u16 = 0;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// A rasterised page, owned by the task that produced it.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Zero-based index of the page this bitmap shows.
    pub page_index: u16,
    pub image: DynamicImage,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Output resolution for rasterised pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// Scale relative to 72 DPI user space.
    pub dpi: u32,
    /// Cap on either edge in pixels, aspect ratio preserved.
    pub max_size: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_size: 2000,
        }
    }
}

impl RenderSettings {
    fn to_pdfium(self) -> PdfRenderConfig {
        let max = self.max_size.min(i32::MAX as u32) as i32;
        PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / POINTS_PER_INCH)
            .set_maximum_width(max)
            .set_maximum_height(max)
    }
}

/// The render adapter: open a document, rasterise one page, release it.
///
/// Implementations must release every native resource they acquire before
/// returning, on success and on error alike, and must report unusable
/// input as a [`RenderError`] rather than panicking.
pub trait PageRenderer: Send + Sync {
    /// Render the zero-based page `index` of the document at `path`.
    fn render_page(&self, path: &Path, index: u16) -> Result<RenderedImage, RenderError>;
}

/// [`PageRenderer`] backed by a pdfium library bound once per run.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    settings: RenderSettings,
    password: Option<String>,
}

impl PdfiumRenderer {
    /// Bind to pdfium.
    ///
    /// `library` may name the library file itself or a directory holding the
    /// platform library. Without it, the platform library in the working
    /// directory is tried first, then the system library.
    pub fn bind(library: Option<&Path>) -> Result<Self, ThumbnailError> {
        let bindings = match library {
            Some(path) => Pdfium::bind_to_library(library_file(path)),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ThumbnailError::PdfiumBindingFailed(format!("{e}")))?;

        info!("Bound pdfium library");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
            settings: RenderSettings::default(),
            password: None,
        })
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Load a document. The handle is closed when it is dropped.
    fn open(&self, path: &Path) -> Result<PdfDocument<'_>, RenderError> {
        let password = self.password.as_deref();
        self.pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| classify_load_error(path, password.is_some(), &e))
    }

    fn rasterise(
        &self,
        document: &PdfDocument<'_>,
        path: &Path,
        index: u16,
    ) -> Result<RenderedImage, RenderError> {
        let pages = document.pages();
        let total = pages.len();
        if index >= total {
            return Err(RenderError::NoPage {
                path: path.to_path_buf(),
                index,
                total,
            });
        }

        let rasterise_err = |e: PdfiumError| RenderError::Rasterise {
            path: path.to_path_buf(),
            index,
            detail: format!("{e:?}"),
        };

        let page = pages.get(index).map_err(rasterise_err)?;
        let bitmap = page
            .render_with_config(&self.settings.to_pdfium())
            .map_err(rasterise_err)?;
        let image = bitmap.as_image();

        debug!(
            "Rendered {} page {} → {}x{} px",
            path.display(),
            index,
            image.width(),
            image.height()
        );

        Ok(RenderedImage {
            page_index: index,
            image,
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_page(&self, path: &Path, index: u16) -> Result<RenderedImage, RenderError> {
        let document = self.open(path)?;
        let rendered = self.rasterise(&document, path, index);
        drop(document);
        rendered
    }
}

/// Resolve a user-supplied library location to the library file.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

/// Map a pdfium load failure to the matching [`RenderError`].
fn classify_load_error(path: &Path, had_password: bool, e: &PdfiumError) -> RenderError {
    let detail = format!("{e:?}");
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            RenderError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            RenderError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        RenderError::Open {
            path: path.to_path_buf(),
            detail,
        }
    }
}
