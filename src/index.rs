//! Year/month folder index.
//!
//! Month folders are named `YYYYMM`. The index groups them by year for the
//! top-level navigation page and is stored as `gallery.json`:
//!
//! ```json
//! [
//!     { "year": 2021, "months": ["202101", "202103"] },
//!     { "year": 2020, "months": ["202012"] }
//! ]
//! ```
//!
//! Years are newest first, months oldest first within a year. Folder names
//! that are not month keys are ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Not a YYYYMM month key: {0}")]
    InvalidMonthKey(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One year row of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearEntry {
    pub year: i32,
    pub months: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GalleryIndex {
    pub years: Vec<YearEntry>,
}

impl GalleryIndex {
    pub fn from_json(bytes: &[u8]) -> Result<Self, IndexError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>, IndexError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn month_count(&self) -> usize {
        self.years.iter().map(|y| y.months.len()).sum()
    }
}

/// Parse a `YYYYMM` folder name into `(year, month)`.
pub fn month_key(key: &str) -> Option<(i32, u32)> {
    if key.len() != 6 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = key[..4].parse().ok()?;
    let month: u32 = key[4..].parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// Human-readable label for a month key: `202101` → `January 2021`.
pub fn month_title(key: &str) -> Result<String, IndexError> {
    let (year, month) =
        month_key(key).ok_or_else(|| IndexError::InvalidMonthKey(key.to_string()))?;
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| IndexError::InvalidMonthKey(key.to_string()))?;
    Ok(date.format("%B %Y").to_string())
}

/// Group folder names into the year/month index.
pub fn build_index<'a>(folder_names: impl IntoIterator<Item = &'a str>) -> GalleryIndex {
    let mut by_year: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    for name in folder_names {
        match month_key(name) {
            Some((year, _)) => by_year.entry(year).or_default().push(name.to_string()),
            None => tracing::debug!(folder = name, "Not a month folder, left out of index"),
        }
    }

    let years = by_year
        .into_iter()
        .rev()
        .map(|(year, mut months)| {
            months.sort();
            months.dedup();
            YearEntry { year, months }
        })
        .collect();
    GalleryIndex { years }
}
