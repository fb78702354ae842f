//! Gallery manifests: one JSON object per month folder, keyed by filename.
//!
//! The web front end reads these files to render a month's gallery page, so
//! the field names are a wire format:
//!
//! ```json
//! {
//!     "a.jpg": {
//!         "src": "gallery_images/202101/a.jpg",
//!         "size": [4000, 3000],
//!         "thumbnail": "gallery_thumbnails/202101/a.jpg",
//!         "thumbnail_size": [213, 160],
//!         "type": "image",
//!         "date": "Photo Date: 01 January 2021 10:00:00",
//!         "unix_time": 1609495200.0,
//!         "mtime": 1700000000.123,
//!         "description": " "
//!     }
//! }
//! ```
//!
//! # Building a manifest
//!
//! A build turns each [`RawRecord`] into an [`ImageRecord`] with
//! [`prepare_record`] and folds the results into the previous manifest with
//! [`merge`]. `merge` is a pure function so the caption rules can be tested
//! without touching the filesystem.
//!
//! ## Caption preservation
//!
//! Captions are typed by hand into the manifest JSON. A rebuild must not
//! blank them: when a file's modification time is unchanged and the previous
//! entry has a non-empty description, that description is carried over
//! verbatim. Every other field is refreshed from the current file. A changed
//! modification time means the photo was replaced or edited, so the caption
//! starts over.
//!
//! ## Stale entries
//!
//! Entries whose files disappeared from disk are kept. [`GalleryManifest::prune`]
//! removes them when the caller asks for it explicitly.
//!
//! # Serialization
//!
//! Keys are kept in a `BTreeMap`, so output is sorted and a rebuild over an
//! unchanged folder is byte-identical. Output is indented with four spaces.

use crate::imaging::display_size;
use crate::metadata::RawRecord;
use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use thiserror::Error;

/// Description given to dated photos that have no caption yet, so the caption
/// area still renders.
pub const DESCRIPTION_PLACEHOLDER: &str = " ";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kind of media an entry points at.
///
/// Serialized as a plain string. Kinds this crate doesn't know are kept
/// verbatim so a rebuild writes them back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaKind {
    Image,
    Video,
    Other(String),
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for MediaKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Other(kind),
        }
    }
}

impl From<MediaKind> for String {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

/// Display metadata for one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub src: String,
    /// Original `(width, height)`.
    pub size: (u32, u32),
    pub thumbnail: String,
    /// On-screen thumbnail size: generated pixels divided by the retina factor.
    pub thumbnail_size: (u32, u32),
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Capture date formatted for display, or empty.
    #[serde(default)]
    pub date: String,
    /// Capture time in seconds since the Unix epoch; the gallery sort key.
    pub unix_time: f64,
    /// Source modification time in seconds since the Unix epoch.
    pub mtime: f64,
    #[serde(default)]
    pub description: String,
}

/// All records of one folder, keyed by filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GalleryManifest {
    pub images: BTreeMap<String, ImageRecord>,
}

impl GalleryManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ManifestError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Pretty-printed JSON with four-space indentation and sorted keys.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, ManifestError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn get(&self, filename: &str) -> Option<&ImageRecord> {
        self.images.get(filename)
    }

    pub fn insert(&mut self, filename: String, record: ImageRecord) {
        self.images.insert(filename, record);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Remove entries whose filename is not in `present`; returns removed names.
    pub fn prune(&mut self, present: &BTreeSet<String>) -> Vec<String> {
        let stale: Vec<String> = self
            .images
            .keys()
            .filter(|name| !present.contains(*name))
            .cloned()
            .collect();
        for name in &stale {
            self.images.remove(name);
        }
        stale
    }
}

/// Format a capture time with a strftime-style format.
///
/// Returns an empty string when no format is configured or when the format
/// is malformed or asks for fields a naive timestamp doesn't have (`%z`).
pub fn format_image_date(captured_at: &NaiveDateTime, format: Option<&str>) -> String {
    let Some(format) = format.filter(|f| !f.is_empty()) else {
        return String::new();
    };

    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        tracing::debug!(format, "Malformed date format, leaving date empty");
        return String::new();
    }

    let mut out = String::new();
    if write!(out, "{}", captured_at.format_with_items(items.iter())).is_err() {
        tracing::debug!(format, "Date format not applicable to capture time");
        return String::new();
    }
    out
}

/// Turn freshly extracted metadata into a manifest record.
///
/// - thumbnail size is scaled back to display size,
/// - `unix_time` comes from the capture time (naive, read as UTC),
/// - `date` is formatted with `date_format`,
/// - a dated record without a description gets [`DESCRIPTION_PLACEHOLDER`].
pub fn prepare_record(raw: &RawRecord, date_format: Option<&str>) -> ImageRecord {
    let date = format_image_date(&raw.captured_at, date_format);
    let description = if !date.is_empty() && raw.description.is_empty() {
        DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        raw.description.clone()
    };

    ImageRecord {
        src: raw.src.clone(),
        size: raw.size.as_tuple(),
        thumbnail: raw.thumbnail.clone(),
        thumbnail_size: display_size(raw.thumbnail_pixels),
        kind: MediaKind::Image,
        date,
        unix_time: raw.captured_at.and_utc().timestamp() as f64,
        mtime: raw.mtime,
        description,
    }
}

/// Fold freshly scanned records into the previous manifest.
///
/// Scanned entries overwrite or insert; entries absent from `scanned` are
/// left alone. See the [module docs](self) for the caption rule.
pub fn merge(old: GalleryManifest, scanned: Vec<(String, ImageRecord)>) -> GalleryManifest {
    let mut merged = old;
    for (filename, mut record) in scanned {
        if let Some(previous) = merged.images.get(&filename)
            && previous.mtime == record.mtime
            && !previous.description.is_empty()
        {
            record.description = previous.description.clone();
        }
        merged.images.insert(filename, record);
    }
    merged
}
