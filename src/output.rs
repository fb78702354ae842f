//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Folders lead with their month label, images with their positional index
//! and filename. Paths and statuses are indented context lines underneath, so
//! the output reads as an inventory of the gallery.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! January 2021 (2 photos)
//!     Source: 202101/
//!     a.jpg: thumbnail created
//!     b.jpg: thumbnail kept
//!     Manifest: 202101.json (2 entries)
//! Index: gallery.json (1 year, 1 month)
//!
//! Built 1 folder: 1 thumbnail created, 1 kept, 0 skipped
//! ```
//!
//! ## Show
//!
//! ```text
//! January 2021 (2 photos)
//!     Background: gallery_images/202101/a.jpg
//! 001 a.jpg
//!     Date: Photo Date: 01 January 2021 12:00:00
//!     Size: 4000x3000 (thumbnail 214x160)
//! 002 b.jpg
//!     Size: 3000x4000 (thumbnail 120x160)
//!     Description: Snow day
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::config::Workspace;
use crate::index::month_title;
use crate::pipeline::{BuildEvent, BuildSummary, FolderSummary, ThumbnailStatus};
use crate::thumbnails::ThumbnailReport;
use crate::view::GalleryPage;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// `January 2021` for month folders, the raw name otherwise.
fn folder_label(folder: &str) -> String {
    month_title(folder).unwrap_or_else(|_| folder.to_string())
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Build output
// ============================================================================

fn manifest_line(summary: &FolderSummary) -> String {
    let mut details = vec![plural(summary.entries, "entry", "entries")];
    if summary.skipped > 0 {
        details.push(format!("{} skipped", summary.skipped));
    }
    if !summary.pruned.is_empty() {
        details.push(format!("{} pruned", summary.pruned.len()));
    }
    format!(
        "{}Manifest: {}.json ({})",
        indent(1),
        summary.folder,
        details.join(", ")
    )
}

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::FolderStarted {
            folder,
            image_count,
        } => vec![
            format!("{} ({})", folder_label(folder), plural(*image_count, "photo", "photos")),
            format!("{}Source: {}/", indent(1), folder),
        ],
        BuildEvent::Thumbnail {
            filename, status, ..
        } => {
            let status = match status {
                ThumbnailStatus::Created => "created".to_string(),
                ThumbnailStatus::Kept => "kept".to_string(),
                ThumbnailStatus::Failed(reason) => format!("failed ({reason})"),
            };
            vec![format!("{}{}: thumbnail {}", indent(1), filename, status)]
        }
        BuildEvent::ImageSkipped {
            filename, reason, ..
        } => vec![format!("{}{}: skipped ({})", indent(1), filename, reason)],
        BuildEvent::FolderFinished(summary) => {
            let mut lines = vec![manifest_line(summary)];
            for name in &summary.pruned {
                lines.push(format!("{}Pruned: {}", indent(2), name));
            }
            lines
        }
        BuildEvent::IndexWritten { years, months } => vec![format!(
            "Index: gallery.json ({}, {})",
            plural(*years, "year", "years"),
            plural(*months, "month", "months")
        )],
    }
}

/// Format the closing summary of a full build.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let created: usize = summary.folders.iter().map(|f| f.thumbnails_created).sum();
    let kept: usize = summary.folders.iter().map(|f| f.thumbnails_kept).sum();
    let skipped: usize = summary.folders.iter().map(|f| f.skipped).sum();
    vec![
        String::new(),
        format!(
            "Built {}: {} created, {} kept, {} skipped",
            plural(summary.folders.len(), "folder", "folders"),
            plural(created, "thumbnail", "thumbnails"),
            kept,
            skipped
        ),
    ]
}

/// Format the closing summary of a thumbnails-only run.
pub fn format_thumbnail_summary(reports: &[(String, ThumbnailReport)]) -> Vec<String> {
    let created: usize = reports.iter().map(|(_, r)| r.created).sum();
    let kept: usize = reports.iter().map(|(_, r)| r.kept).sum();
    let failed: usize = reports.iter().map(|(_, r)| r.failed_count()).sum();
    let collided: usize = reports.iter().map(|(_, r)| r.collisions.len()).sum();
    vec![
        String::new(),
        format!(
            "Thumbnails for {}: {} created, {} kept, {} failed, {} skipped",
            plural(reports.len(), "folder", "folders"),
            created,
            kept,
            failed,
            collided
        ),
    ]
}

// ============================================================================
// Show output
// ============================================================================

/// Format one month's gallery page as a listing.
pub fn format_listing(page: &GalleryPage) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        page.title,
        plural(page.images.len(), "photo", "photos")
    )];
    if let Some(bg) = &page.background_photo {
        lines.push(format!("{}Background: {}", indent(1), bg));
    }

    for (i, entry) in page.images.iter().enumerate() {
        let rec = &entry.record;
        lines.push(format!("{} {}", format_index(i + 1), entry.name));
        if !rec.date.is_empty() {
            lines.push(format!("{}Date: {}", indent(1), rec.date));
        }
        lines.push(format!(
            "{}Size: {}x{} (thumbnail {}x{})",
            indent(1),
            rec.size.0,
            rec.size.1,
            rec.thumbnail_size.0,
            rec.thumbnail_size.1
        ));
        let description = rec.description.trim();
        if !description.is_empty() {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(description, 60)
            ));
        }
    }
    lines
}

// ============================================================================
// Check output
// ============================================================================

/// Format resolved paths and folders for `check`.
///
/// `folders` pairs each folder name with its image count.
pub fn format_check(workspace: &Workspace, folders: &[(String, usize)]) -> Vec<String> {
    let mut lines = vec![
        format!("Images: {}", workspace.images_root().display()),
        format!("Thumbnails: {}", workspace.thumbnails_root().display()),
        format!("Metadata: {}", workspace.metadata_dir().display()),
        format!("Public path: {}", workspace.public_path().display()),
        String::new(),
        "Folders".to_string(),
    ];
    for (i, (name, count)) in folders.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            folder_label(name),
            plural(*count, "photo", "photos")
        ));
        lines.push(format!("{}Source: {}/", indent(1), name));
        if *count == 0 {
            lines.push(format!("{}Warning: no images, build would fail", indent(1)));
        }
        if month_title(name).is_err() {
            lines.push(format!("{}Warning: not a YYYYMM folder, left out of index", indent(1)));
        }
    }
    lines
}

// ============================================================================
// Print wrappers
// ============================================================================

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_build_summary(summary: &BuildSummary) {
    print_lines(format_build_summary(summary));
}

pub fn print_thumbnail_summary(reports: &[(String, ThumbnailReport)]) {
    print_lines(format_thumbnail_summary(reports));
}

pub fn print_listing(page: &GalleryPage) {
    print_lines(format_listing(page));
}

pub fn print_check(workspace: &Workspace, folders: &[(String, usize)]) {
    print_lines(format_check(workspace, folders));
}

// ============================================================================
// Tests
// ============================================================================
