//! Output writer: persist a rendered page as `<stem>.png`.
//!
//! PNG is lossless, so thin strokes and small text survive. The bytes are
//! written to a temporary file inside the destination directory and renamed
//! over the target only once encoding finished, so a failed task never
//! leaves a truncated thumbnail behind and a rerun simply replaces the old
//! file.

use crate::error::WriteError;
use crate::pipeline::render::RenderedImage;
use image::ImageFormat;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Extension of every thumbnail, without the dot.
pub const THUMBNAIL_EXTENSION: &str = "png";

/// Thumbnail file name for a source file name: extension swapped for `.png`.
///
/// Only the last extension is replaced (`report.v2.pdf` → `report.v2.png`).
pub fn thumbnail_file_name(base_name: impl AsRef<Path>) -> PathBuf {
    base_name.as_ref().with_extension(THUMBNAIL_EXTENSION)
}

/// Full thumbnail path for a source file written into `dest_dir`.
pub fn thumbnail_path(dest_dir: &Path, source: &Path) -> PathBuf {
    let base = source.file_name().map(Path::new).unwrap_or(source);
    dest_dir.join(thumbnail_file_name(base))
}

/// Encode `image` as PNG into `dest_dir/<stem(base_name)>.png`.
///
/// An existing thumbnail of the same name is replaced. The image is consumed.
pub fn write_thumbnail(
    image: RenderedImage,
    dest_dir: &Path,
    base_name: impl AsRef<Path>,
) -> Result<PathBuf, WriteError> {
    let path = dest_dir.join(thumbnail_file_name(base_name));

    let tmp = NamedTempFile::new_in(dest_dir).map_err(|e| WriteError::Create {
        dir: dest_dir.to_path_buf(),
        source: e,
    })?;

    let mut writer = BufWriter::new(tmp);
    image
        .image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|e| WriteError::Encode {
            path: path.clone(),
            source: e,
        })?;
    writer.flush().map_err(|e| WriteError::Encode {
        path: path.clone(),
        source: image::ImageError::IoError(e),
    })?;

    let tmp = writer.into_inner().map_err(|e| WriteError::Encode {
        path: path.clone(),
        source: image::ImageError::IoError(e.into_error()),
    })?;

    tmp.persist(&path).map_err(|e| WriteError::Persist {
        path: path.clone(),
        source: e.error,
    })?;

    debug!("Wrote {}", path.display());
    Ok(path)
}
