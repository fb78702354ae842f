//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the build needs:
//! identify, capture_time, and thumbnail.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! `MockBackend` below, which records operations instead of touching pixels.

use super::params::ThumbnailParams;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    /// The source decoded fine but the output file could not be written.
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// Wrap an I/O error raised while writing `path`.
    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this is an output failure rather than a problem with the source.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` because thumbnails for one folder are generated on the rayon pool.
pub trait ImageBackend: Sync {
    /// Get display dimensions (orientation already applied).
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Capture timestamp embedded in the file, if any.
    ///
    /// Missing or unparseable metadata is `None`, never an error: the caller
    /// falls back to the file modification time.
    fn capture_time(&self, path: &Path) -> Option<NaiveDateTime>;

    /// Write a thumbnail and return its pixel dimensions.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError>;
}
