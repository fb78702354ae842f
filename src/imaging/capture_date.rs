//! Capture timestamp extraction from embedded EXIF data.
//!
//! Tags are tried in order: `DateTimeOriginal` (shutter press),
//! `DateTimeDigitized`, then `DateTime` (last edit, which some phones write
//! instead of the other two). EXIF timestamps carry no zone, so the result is
//! a naive local wall-clock time.

use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const DATE_TAGS: &[Tag] = &[Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Read the capture timestamp of an image file.
///
/// Returns `None` when the file can't be opened, has no EXIF block, or none
/// of the date tags hold a valid timestamp.
pub fn read_capture_time(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;

    DATE_TAGS.iter().find_map(|tag| {
        let field = exif.get_field(*tag, In::PRIMARY)?;
        match field.value {
            Value::Ascii(ref values) => values.first().and_then(|raw| parse_exif_datetime(raw)),
            _ => None,
        }
    })
}

/// Parse an EXIF ASCII timestamp (`YYYY:MM:DD HH:MM:SS`).
fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)?.and_hms_opt(
        dt.hour as u32,
        dt.minute as u32,
        dt.second as u32,
    )
}
