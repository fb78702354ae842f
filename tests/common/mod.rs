//! Fixtures shared by the integration tests.

use image::{ImageEncoder, RgbImage};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 2021-01-01 00:00:00 UTC.
pub const JAN_1_2021: u64 = 1_609_459_200;
pub const DAY: u64 = 86_400;

/// APP1 segment with a little-endian TIFF block holding only `DateTimeOriginal`.
fn exif_app1(timestamp: &str) -> Vec<u8> {
    assert_eq!(timestamp.len(), 19);
    let mut tiff: Vec<u8> = vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
    // IFD0 → Exif IFD at 26
    tiff.extend_from_slice(&[0x01, 0x00, 0x69, 0x87, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00]);
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&[0x00; 4]);
    // Exif IFD → DateTimeOriginal string at 44
    tiff.extend_from_slice(&[0x01, 0x00, 0x03, 0x90, 0x02, 0x00, 0x14, 0x00, 0x00, 0x00]);
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&[0x00; 4]);
    tiff.extend_from_slice(timestamp.as_bytes());
    tiff.push(0);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);
    segment
}

/// Write a `width`x`height` JPEG, optionally with an EXIF capture time
/// (`"YYYY:MM:DD HH:MM:SS"`).
pub fn write_jpeg(path: &Path, width: u32, height: u32, taken: Option<&str>) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 4 % 256) as u8, (y * 4 % 256) as u8, 90])
    });
    let mut encoded = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut encoded)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();

    let bytes = match taken {
        Some(ts) => {
            let mut out = encoded[..2].to_vec();
            out.extend_from_slice(&exif_app1(ts));
            out.extend_from_slice(&encoded[2..]);
            out
        }
        None => encoded,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Set a file's modification time to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let when: SystemTime = UNIX_EPOCH + Duration::from_secs(secs);
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}
