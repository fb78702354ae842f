//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Capture date | `kamadak-exif` via [`capture_date`](super::capture_date) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::scale_to_height;
use super::params::ThumbnailParams;
use chrono::NaiveDateTime;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether a path has an extension this backend can decode (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
}

fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Load and decode an image from disk, upright.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| decode_error(path, e))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Encode as JPEG into a temp file beside `output`, then rename into place.
fn save_jpeg(img: &DynamicImage, output: &Path, quality: u8) -> Result<(), BackendError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| BackendError::write(dir, e))?;

    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| BackendError::write(dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality);
        // JPEG has no alpha channel
        DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(encoder)
            .map_err(|e| match e {
                image::ImageError::IoError(source) => BackendError::write(tmp.path(), source),
                other => BackendError::ProcessingFailed(format!("JPEG encode failed: {}", other)),
            })?;
        writer
            .flush()
            .map_err(|e| BackendError::write(tmp.path(), e))?;
    }
    tmp.persist(output)
        .map_err(|e| BackendError::write(output, e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let mut decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        if swaps_axes(orientation) {
            Ok(Dimensions::new(height, width))
        } else {
            Ok(Dimensions::new(width, height))
        }
    }

    fn capture_time(&self, path: &Path) -> Option<NaiveDateTime> {
        super::capture_date::read_capture_time(path)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let target = scale_to_height(Dimensions::new(img.width(), img.height()), params.height);
        let resized = img.resize_exact(target.width, target.height, FilterType::Lanczos3);
        save_jpeg(&resized, &params.output, params.quality.value() as u8)?;
        Ok(target)
    }
}
