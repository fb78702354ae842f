//! Per-image metadata extraction.
//!
//! For one source photo this gathers everything the manifest needs that comes
//! straight from the filesystem:
//!
//! - **Dimensions** of the original (upright, orientation applied).
//! - **Capture time**: the embedded EXIF timestamp when present, otherwise the
//!   file modification time. A photo copied off a camera keeps its EXIF date;
//!   a screenshot or scan falls back to when the file was last written.
//! - **Modification time**: seconds since the Unix epoch. This is the change
//!   fingerprint the manifest merge uses to decide whether a hand-written
//!   caption still belongs to the file.
//! - **Thumbnail dimensions**, read back from the generated thumbnail.
//! - **Public paths**: `src` and `thumbnail` relative to the folder's public
//!   base path, always `/`-separated so they can be used as object keys.
//!
//! The description always starts empty; see [`crate::manifest`] for how
//! placeholders and preserved captions are layered on top.

use crate::imaging::{BackendError, Dimensions, ImageBackend};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Cannot read thumbnail {path}: {source}")]
    Thumbnail {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Freshly extracted facts about one image, before any formatting or merging.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub filename: String,
    /// Source path relative to the public base path.
    pub src: String,
    pub size: Dimensions,
    /// Thumbnail path relative to the public base path.
    pub thumbnail: String,
    /// Pixel dimensions of the generated thumbnail (retina scaled).
    pub thumbnail_pixels: Dimensions,
    pub captured_at: NaiveDateTime,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: f64,
    pub description: String,
}

/// Extract the raw record for one image and its already generated thumbnail.
pub fn extract(
    backend: &impl ImageBackend,
    source: &Path,
    thumbnail: &Path,
    public_path: &Path,
) -> Result<RawRecord, MetadataError> {
    let size = backend
        .identify(source)
        .map_err(|source_err| MetadataError::Decode {
            path: source.to_path_buf(),
            source: source_err,
        })?;

    let modified = std::fs::metadata(source)?.modified()?;
    let mtime = epoch_seconds(modified);
    let captured_at = backend
        .capture_time(source)
        .unwrap_or_else(|| DateTime::<Utc>::from(modified).naive_utc());

    let thumbnail_pixels =
        backend
            .identify(thumbnail)
            .map_err(|source_err| MetadataError::Thumbnail {
                path: thumbnail.to_path_buf(),
                source: source_err,
            })?;

    let filename = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(RawRecord {
        filename,
        src: public_relative(source, public_path),
        size,
        thumbnail: public_relative(thumbnail, public_path),
        thumbnail_pixels,
        captured_at,
        mtime,
        description: String::new(),
    })
}

/// Seconds since the Unix epoch, negative for times before it.
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Express `path` relative to `base` with `/` separators.
///
/// Paths outside `base` are returned as-is (still `/`-separated), which the
/// presentation layer treats as an absolute location.
pub fn public_relative(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect();
    let joined = parts.join("/");
    if relative.has_root() {
        format!("/{joined}")
    } else {
        joined
    }
}
