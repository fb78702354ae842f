//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// Factor by which generated thumbnails are larger than their on-screen size,
/// so they stay sharp on high-density displays.
pub const RETINA_SCALE_FACTOR: u32 = 2;

/// Pixel height to generate for a configured display height.
///
/// ```
/// # use gallery_build::imaging::generated_height;
/// assert_eq!(generated_height(160), 320);
/// ```
pub fn generated_height(display_height: u32) -> u32 {
    display_height.saturating_mul(RETINA_SCALE_FACTOR)
}

/// Scale dimensions to an exact height, preserving aspect ratio.
///
/// Width is rounded and never drops below one pixel. Sources smaller than the
/// target are scaled up so every thumbnail has the same height.
pub fn scale_to_height(source: Dimensions, height: u32) -> Dimensions {
    if source.height == 0 {
        return Dimensions::new(source.width.max(1), height);
    }
    let width = (source.width as f64 * height as f64 / source.height as f64).round() as u32;
    Dimensions::new(width.max(1), height)
}

/// Convert generated thumbnail pixels back to the size it is displayed at.
///
/// ```
/// # use gallery_build::imaging::{display_size, Dimensions};
/// assert_eq!(display_size(Dimensions::new(427, 320)), (214, 160));
/// ```
pub fn display_size(generated: Dimensions) -> (u32, u32) {
    let factor = RETINA_SCALE_FACTOR as f64;
    (
        (generated.width as f64 / factor).round() as u32,
        (generated.height as f64 / factor).round() as u32,
    )
}
