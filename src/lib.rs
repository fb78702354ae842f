//! # Gallery Build
//!
//! Builds the metadata a month-by-month photo gallery needs: thumbnails,
//! one JSON manifest per month folder, and a year/month index. The web front
//! end only reads these files; everything expensive happens here, offline.
//!
//! # Pipeline
//!
//! ```text
//! gallery_images/YYYYMM/*.jpg
//!     → thumbnails   gallery_thumbnails/YYYYMM/*.jpg   (2x display height)
//!     → manifest     image_metadata/YYYYMM.json        (dates, sizes, captions)
//!     → index        image_metadata/gallery.json       (years → months)
//! ```
//!
//! Each step is idempotent. Thumbnails of the right height are left alone,
//! and a rebuild of an unchanged folder writes a byte-identical manifest.
//! Captions typed into a manifest survive rebuilds for as long as the photo
//! file itself is unchanged.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `gallery.toml` loading, validation, path resolution, folder discovery |
//! | [`imaging`] | Image backend: dimensions, EXIF capture date, JPEG thumbnails |
//! | [`metadata`] | Per-image facts: size, capture time, mtime, public paths |
//! | [`thumbnails`] | Parallel thumbnail generation for one folder |
//! | [`manifest`] | Manifest records, the caption-preserving merge, JSON format |
//! | [`index`] | `YYYYMM` month keys and the year/month index |
//! | [`store`] | [`MetadataStore`](store::MetadataStore) seam over directories and memory |
//! | [`pipeline`] | Orchestration of the steps above, progress events |
//! | [`view`] | Capture-ordered listings, URL resolution, page models |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Capture Time Is UTC
//!
//! EXIF timestamps carry no zone. They are read as UTC when computing
//! `unix_time`, so the same photo sorts identically no matter which machine
//! ran the build.
//!
//! ## Manifests Are Written Whole
//!
//! A folder's manifest is written once, after every image of the folder was
//! processed, through a temp file and a rename. A failed build leaves the
//! previous manifest in place rather than a partial one.
//!
//! ## Backends Are Swappable
//!
//! Image work goes through the [`ImageBackend`](imaging::ImageBackend) trait.
//! Production uses the pure-Rust [`RustBackend`](imaging::RustBackend); tests
//! use a recording mock, so pipeline logic is tested without decoding pixels.

pub mod config;
pub mod imaging;
pub mod index;
pub mod logging;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod thumbnails;
pub mod view;
