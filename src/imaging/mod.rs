//! Image processing in pure Rust, no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageDecoder::dimensions` + EXIF orientation |
//! | **Capture date** | `kamadak-exif` (`DateTimeOriginal` → `DateTimeDigitized` → `DateTime`) |
//! | **Thumbnail** | `resize_exact` (Lanczos3) to a fixed height → JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod capture_date;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{RETINA_SCALE_FACTOR, display_size, generated_height, scale_to_height};
pub use operations::{
    ThumbnailConfig, ThumbnailOutcome, ensure_thumbnail, plan_thumbnail, thumbnail_path,
};
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::{RustBackend, is_supported_image};
