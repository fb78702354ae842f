//! Presentation-side views over stored metadata.
//!
//! These are the transforms the web front end applies before rendering: the
//! month page wants images in capture order with fetchable URLs and a
//! background photo, the landing page wants readable month labels. They're
//! pure functions over [`GalleryManifest`] and [`GalleryIndex`], used by the
//! `show` command and available to any server embedding this crate.

use crate::index::{GalleryIndex, IndexError, month_title};
use crate::manifest::{GalleryManifest, ImageRecord, MediaKind};
use serde::Serialize;

/// Display height of thumbnails on the month page.
pub const PAGE_THUMBNAIL_HEIGHT: u32 = 160;
/// Vertical offset of the background photo on the month page.
pub const BACKGROUND_PHOTO_OFFSET: u32 = 30;

/// A manifest record together with its filename.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    pub name: String,
    #[serde(flatten)]
    pub record: ImageRecord,
}

/// Records of a manifest in capture order, ties broken by filename.
pub fn gallery_listing(manifest: &GalleryManifest) -> Vec<ListingEntry> {
    let mut listing: Vec<ListingEntry> = manifest
        .images
        .iter()
        .map(|(name, record)| ListingEntry {
            name: name.clone(),
            record: record.clone(),
        })
        .collect();
    listing.sort_by(|a, b| {
        a.record
            .unix_time
            .total_cmp(&b.record.unix_time)
            .then_with(|| a.name.cmp(&b.name))
    });
    listing
}

/// Turns a stored path into a URL the browser can fetch.
///
/// Production deployments plug in a signer that issues time-limited links.
pub trait UrlResolver {
    fn resolve(&self, path: &str) -> String;
}

/// Resolver that prefixes paths with a base URL and optional subfolder.
#[derive(Debug, Clone, Default)]
pub struct PrefixResolver {
    base: String,
    subfolder: String,
}

impl PrefixResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            subfolder: String::new(),
        }
    }

    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = subfolder.into();
        self
    }
}

impl UrlResolver for PrefixResolver {
    fn resolve(&self, path: &str) -> String {
        let parts = [
            self.base.trim_end_matches('/'),
            self.subfolder.trim_matches('/'),
            path.trim_start_matches('/'),
        ];
        parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Rewrite `src` and `thumbnail` of every entry through `resolver`.
pub fn resolve_urls(listing: &mut [ListingEntry], resolver: &impl UrlResolver) {
    for entry in listing {
        entry.record.src = resolver.resolve(&entry.record.src);
        entry.record.thumbnail = resolver.resolve(&entry.record.thumbnail);
    }
}

/// `src` of the first still image in the listing.
pub fn background_photo(listing: &[ListingEntry]) -> Option<&str> {
    listing
        .iter()
        .find(|e| e.record.kind == MediaKind::Image)
        .map(|e| e.record.src.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthLink {
    pub path: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRow {
    pub year: i32,
    pub months: Vec<MonthLink>,
}

/// Landing page rows: every month key paired with its label.
pub fn index_rows(index: &GalleryIndex) -> Result<Vec<IndexRow>, IndexError> {
    index
        .years
        .iter()
        .map(|entry| {
            let months = entry
                .months
                .iter()
                .map(|key| {
                    Ok(MonthLink {
                        path: key.clone(),
                        title: month_title(key)?,
                    })
                })
                .collect::<Result<Vec<_>, IndexError>>()?;
            Ok(IndexRow {
                year: entry.year,
                months,
            })
        })
        .collect()
}

/// Everything the month page template needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryPage {
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail_height: u32,
    pub background_photo: Option<String>,
    pub background_photo_offset: u32,
    pub images: Vec<ListingEntry>,
}

impl GalleryPage {
    pub fn build(
        month: &str,
        manifest: &GalleryManifest,
        resolver: &impl UrlResolver,
    ) -> Result<Self, IndexError> {
        let title = month_title(month)?;
        let mut images = gallery_listing(manifest);
        resolve_urls(&mut images, resolver);
        let background_photo = background_photo(&images).map(str::to_string);

        Ok(Self {
            title,
            description: String::new(),
            url: String::new(),
            thumbnail_height: PAGE_THUMBNAIL_HEIGHT,
            background_photo,
            background_photo_offset: BACKGROUND_PHOTO_OFFSET,
            images,
        })
    }
}
