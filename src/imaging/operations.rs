//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, decide what to do, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::generated_height;
use super::params::{Quality, ThumbnailParams};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// On-screen height in CSS pixels.
    pub display_height: u32,
    pub quality: Quality,
}

impl ThumbnailConfig {
    /// Pixel height thumbnails are generated at.
    pub fn pixel_height(&self) -> u32 {
        generated_height(self.display_height)
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            display_height: 160,
            quality: Quality::default(),
        }
    }
}

/// What [`ensure_thumbnail`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// A new thumbnail was written.
    Created(Dimensions),
    /// The existing thumbnail already had the target height.
    Kept(Dimensions),
}

impl ThumbnailOutcome {
    pub fn dimensions(self) -> Dimensions {
        match self {
            Self::Created(d) | Self::Kept(d) => d,
        }
    }

    pub fn is_created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Thumbnail location for a source photo: the name up to the first dot, as `.jpg`.
///
/// `IMG_1.edited.png` → `<dir>/IMG_1.jpg`
pub fn thumbnail_path(thumbnails_dir: &Path, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    thumbnails_dir.join(format!("{stem}.jpg"))
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(source: &Path, output: &Path, config: &ThumbnailConfig) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        height: config.pixel_height(),
        quality: config.quality,
    }
}

/// Create a thumbnail unless a correctly sized one already exists.
///
/// An existing file is kept only when its height equals the target pixel
/// height exactly and `force` is off. An existing file that can't be read is
/// treated as wrong-sized and regenerated.
pub fn ensure_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &ThumbnailConfig,
    force: bool,
) -> Result<ThumbnailOutcome> {
    let target = config.pixel_height();

    if !force
        && output.exists()
        && let Ok(existing) = backend.identify(output)
        && existing.height == target
    {
        return Ok(ThumbnailOutcome::Kept(existing));
    }

    let params = plan_thumbnail(source, output, config);
    let dims = backend.thumbnail(&params)?;
    Ok(ThumbnailOutcome::Created(dims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn thumbnail_path_uses_first_dot() {
        let dir = Path::new("/thumbs");
        assert_eq!(
            thumbnail_path(dir, Path::new("/photos/IMG_1.JPG")),
            PathBuf::from("/thumbs/IMG_1.jpg")
        );
        assert_eq!(
            thumbnail_path(dir, Path::new("/photos/IMG_1.edited.png")),
            PathBuf::from("/thumbs/IMG_1.jpg")
        );
    }

    #[test]
    fn plan_thumbnail_doubles_display_height() {
        let params = plan_thumbnail(
            Path::new("/source.jpg"),
            Path::new("/thumb.jpg"),
            &ThumbnailConfig::default(),
        );

        assert_eq!(params.height, 320);
        assert_eq!(params.quality, Quality::default());
    }

    #[test]
    fn missing_thumbnail_is_created() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        let output = tmp.path().join("thumbs/a.jpg");
        let backend = MockBackend::new().with_image(&source, Dimensions::new(800, 600));

        let outcome =
            ensure_thumbnail(&backend, &source, &output, &ThumbnailConfig::default(), false)
                .unwrap();

        assert_eq!(outcome, ThumbnailOutcome::Created(Dimensions::new(427, 320)));
        assert_eq!(backend.thumbnail_count(), 1);
    }

    #[test]
    fn correctly_sized_thumbnail_is_kept() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        let output = tmp.path().join("a-thumb.jpg");
        fs::write(&output, b"").unwrap();
        let backend = MockBackend::new()
            .with_image(&source, Dimensions::new(800, 600))
            .with_image(&output, Dimensions::new(427, 320));

        let outcome =
            ensure_thumbnail(&backend, &source, &output, &ThumbnailConfig::default(), false)
                .unwrap();

        assert_eq!(outcome, ThumbnailOutcome::Kept(Dimensions::new(427, 320)));
        assert_eq!(backend.thumbnail_count(), 0);
    }

    #[test]
    fn wrong_height_thumbnail_is_regenerated() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        let output = tmp.path().join("a-thumb.jpg");
        fs::write(&output, b"").unwrap();
        // Generated for an older display height of 100
        let backend = MockBackend::new()
            .with_image(&source, Dimensions::new(800, 600))
            .with_image(&output, Dimensions::new(267, 200));

        let outcome =
            ensure_thumbnail(&backend, &source, &output, &ThumbnailConfig::default(), false)
                .unwrap();

        assert!(outcome.is_created());
        assert_eq!(outcome.dimensions().height, 320);
    }

    #[test]
    fn force_regenerates_correct_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        let output = tmp.path().join("a-thumb.jpg");
        fs::write(&output, b"").unwrap();
        let backend = MockBackend::new()
            .with_image(&source, Dimensions::new(800, 600))
            .with_image(&output, Dimensions::new(427, 320));

        let outcome =
            ensure_thumbnail(&backend, &source, &output, &ThumbnailConfig::default(), true)
                .unwrap();

        assert!(outcome.is_created());
        let ops = backend.get_operations();
        assert!(
            !ops.iter()
                .any(|op| matches!(op, RecordedOp::Identify(p) if p.ends_with("a-thumb.jpg"))),
            "force must not inspect the existing thumbnail"
        );
    }

    #[test]
    fn unreadable_existing_thumbnail_is_regenerated() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        let output = tmp.path().join("a-thumb.jpg");
        fs::write(&output, b"half-written").unwrap();
        let backend = MockBackend::new().with_image(&source, Dimensions::new(600, 600));

        let outcome =
            ensure_thumbnail(&backend, &source, &output, &ThumbnailConfig::default(), false)
                .unwrap();

        assert_eq!(outcome, ThumbnailOutcome::Created(Dimensions::new(320, 320)));
    }

    #[test]
    fn undecodable_source_propagates_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("broken.jpg");
        let output = tmp.path().join("broken-thumb.jpg");
        let backend = MockBackend::new();

        let result =
            ensure_thumbnail(&backend, &source, &output, &ThumbnailConfig::default(), false);
        assert!(result.is_err());
    }
}
