//! Build orchestration: thumbnails, manifests, then the folder index.
//!
//! ```text
//! for each month folder:
//!     list images  →  thumbnails (parallel)  →  extract + merge  →  <folder>.json
//! after every folder succeeded:
//!     folder names  →  gallery.json
//! ```
//!
//! ## Failure model
//!
//! A single unreadable image is skipped with a warning and a
//! [`BuildEvent::ImageSkipped`]; the rest of the folder still builds. So is an
//! image whose thumbnail name was already claimed by an earlier file. A folder
//! with no images, a manifest that can't be parsed, a thumbnail that can't be
//! written, or any other storage failure is fatal and stops the run at that
//! folder before its manifest is touched.
//!
//! A folder's manifest is written once, after the whole folder built, so a
//! stored manifest is always complete. Folders finished before a fatal error
//! keep their new manifests. Thumbnails written for the failing folder stay on
//! disk; nothing references them until a later build succeeds. The index is
//! only rewritten when every folder succeeded.

use crate::config::{ConfigError, FolderConfig, INDEX_KEY, Workspace, is_plain_folder_name};
use crate::imaging::{BackendError, ImageBackend, is_supported_image, thumbnail_path};
use crate::index::{GalleryIndex, IndexError, build_index};
use crate::manifest::{GalleryManifest, ManifestError, merge, prepare_record};
use crate::metadata::extract;
use crate::store::{MetadataStore, StoreError};
use crate::thumbnails::{ThumbnailReport, create_thumbnails};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("No images found in {0}")]
    NoImages(PathBuf),
    #[error("Invalid folder name: {0:?}")]
    InvalidFolder(String),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Cannot write thumbnail {path}: {source}")]
    Thumbnail {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Manifest {key} is unreadable: {source}")]
    Manifest {
        key: String,
        #[source]
        source: ManifestError,
    },
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

/// Thumbnail status for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailStatus {
    Created,
    Kept,
    Failed(String),
}

/// Progress events sent to the CLI printer thread.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    FolderStarted {
        folder: String,
        image_count: usize,
    },
    Thumbnail {
        folder: String,
        filename: String,
        status: ThumbnailStatus,
    },
    ImageSkipped {
        folder: String,
        filename: String,
        reason: String,
    },
    FolderFinished(FolderSummary),
    IndexWritten {
        years: usize,
        months: usize,
    },
}

/// Outcome of building one folder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderSummary {
    pub folder: String,
    /// Image files found on disk.
    pub images: usize,
    pub thumbnails_created: usize,
    pub thumbnails_kept: usize,
    /// Images left out of this build: unreadable, or sharing a thumbnail name.
    pub skipped: usize,
    /// Entries removed because their file is gone (only with `prune`).
    pub pruned: Vec<String>,
    /// Entries in the written manifest.
    pub entries: usize,
}

/// Result of a full [`run`].
#[derive(Debug)]
pub struct BuildSummary {
    pub folders: Vec<FolderSummary>,
    pub index: GalleryIndex,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Regenerate thumbnails even when they look current.
    pub force: bool,
    /// Drop manifest entries whose file no longer exists.
    pub prune: bool,
    /// Restrict the build to these folders. Empty means all.
    pub only: Vec<String>,
}

fn send(events: Option<&Sender<BuildEvent>>, event: BuildEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

/// Image files directly inside `dir`, sorted by filename.
///
/// Only names containing a `.` with a supported image extension count.
/// A missing directory has no images.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| PipelineError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let has_dot = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().contains('.'));
        if has_dot && is_supported_image(path) {
            images.push(path.to_path_buf());
        }
    }
    Ok(images)
}

/// Read a stored manifest; a missing key is an empty manifest.
pub fn load_manifest(
    store: &impl MetadataStore,
    key: &str,
) -> Result<GalleryManifest, PipelineError> {
    match store.read(key)? {
        Some(bytes) => GalleryManifest::from_json(&bytes).map_err(|source| {
            PipelineError::Manifest {
                key: key.to_string(),
                source,
            }
        }),
        None => Ok(GalleryManifest::new()),
    }
}

/// Read the stored folder index; a missing index is empty.
pub fn load_index(store: &impl MetadataStore) -> Result<GalleryIndex, PipelineError> {
    match store.read(INDEX_KEY)? {
        Some(bytes) => Ok(GalleryIndex::from_json(&bytes)?),
        None => Ok(GalleryIndex::default()),
    }
}

/// Folders a build should touch: `only` when given, else every folder.
pub fn select_folders(
    workspace: &Workspace,
    only: &[String],
) -> Result<Vec<String>, PipelineError> {
    if only.is_empty() {
        return Ok(workspace.folder_names()?);
    }
    if let Some(bad) = only.iter().find(|name| !is_plain_folder_name(name)) {
        return Err(PipelineError::InvalidFolder(bad.clone()));
    }
    Ok(only.to_vec())
}

/// Build thumbnails and the manifest for one folder.
pub fn build_folder(
    backend: &impl ImageBackend,
    store: &impl MetadataStore,
    folder: &FolderConfig,
    options: &BuildOptions,
    events: Option<&Sender<BuildEvent>>,
) -> Result<FolderSummary, PipelineError> {
    let images = list_images(&folder.images_dir)?;
    if images.is_empty() {
        return Err(PipelineError::NoImages(folder.images_dir.clone()));
    }
    tracing::debug!(folder = %folder.name, images = images.len(), "Building folder");
    send(
        events,
        BuildEvent::FolderStarted {
            folder: folder.name.clone(),
            image_count: images.len(),
        },
    );

    std::fs::create_dir_all(&folder.thumbnails_dir).map_err(|source| PipelineError::Io {
        path: folder.thumbnails_dir.clone(),
        source,
    })?;
    let report: ThumbnailReport =
        create_thumbnails(backend, folder, &images, options.force, events)?;
    let no_thumbnail: HashSet<&Path> = report.without_thumbnail().collect();

    let mut summary = FolderSummary {
        folder: folder.name.clone(),
        images: images.len(),
        thumbnails_created: report.created,
        thumbnails_kept: report.kept,
        ..FolderSummary::default()
    };

    let mut scanned = Vec::with_capacity(images.len());
    for source in &images {
        if no_thumbnail.contains(source.as_path()) {
            // Already reported by the thumbnail step
            summary.skipped += 1;
            continue;
        }
        let thumbnail = thumbnail_path(&folder.thumbnails_dir, source);
        match extract(backend, source, &thumbnail, &folder.public_path) {
            Ok(raw) => {
                let record = prepare_record(&raw, folder.date_format.as_deref());
                scanned.push((raw.filename, record));
            }
            Err(e) => {
                tracing::warn!(file = %source.display(), error = %e, "Skipping unreadable image");
                summary.skipped += 1;
                send(
                    events,
                    BuildEvent::ImageSkipped {
                        folder: folder.name.clone(),
                        filename: display_name(source),
                        reason: e.to_string(),
                    },
                );
            }
        }
    }

    let previous = load_manifest(store, &folder.manifest_key)?;
    let mut manifest = merge(previous, scanned);
    if options.prune {
        let present: BTreeSet<String> = images.iter().map(|p| display_name(p)).collect();
        summary.pruned = manifest.prune(&present);
        for name in &summary.pruned {
            tracing::debug!(folder = %folder.name, file = %name, "Pruned stale entry");
        }
    }
    summary.entries = manifest.len();

    let bytes = manifest
        .to_json_pretty()
        .map_err(|source| PipelineError::Manifest {
            key: folder.manifest_key.clone(),
            source,
        })?;
    store.write(&folder.manifest_key, &bytes)?;

    tracing::info!(
        folder = %folder.name,
        entries = summary.entries,
        created = summary.thumbnails_created,
        skipped = summary.skipped,
        "Folder built"
    );
    send(events, BuildEvent::FolderFinished(summary.clone()));
    Ok(summary)
}

/// Rebuild and store `gallery.json` from folder names.
pub fn write_index<'a>(
    store: &impl MetadataStore,
    folder_names: impl IntoIterator<Item = &'a str>,
    events: Option<&Sender<BuildEvent>>,
) -> Result<GalleryIndex, PipelineError> {
    let index = build_index(folder_names);
    store.write(INDEX_KEY, &index.to_json_pretty()?)?;
    tracing::info!(years = index.years.len(), months = index.month_count(), "Index written");
    send(
        events,
        BuildEvent::IndexWritten {
            years: index.years.len(),
            months: index.month_count(),
        },
    );
    Ok(index)
}

/// Full build: every selected folder, then the index.
///
/// The index always lists every folder of the workspace, not just the ones
/// selected with `only`.
pub fn run(
    backend: &impl ImageBackend,
    store: &impl MetadataStore,
    workspace: &Workspace,
    options: &BuildOptions,
    events: Option<&Sender<BuildEvent>>,
) -> Result<BuildSummary, PipelineError> {
    let selected = select_folders(workspace, &options.only)?;

    let mut folders = Vec::with_capacity(selected.len());
    for name in &selected {
        let folder = workspace.folder(name);
        folders.push(build_folder(backend, store, &folder, options, events)?);
    }

    let all = if options.only.is_empty() {
        selected
    } else {
        workspace.folder_names()?
    };
    let index = write_index(store, all.iter().map(String::as_str), events)?;
    Ok(BuildSummary { folders, index })
}

/// Thumbnails only, no manifests or index.
pub fn run_thumbnails(
    backend: &impl ImageBackend,
    workspace: &Workspace,
    options: &BuildOptions,
    events: Option<&Sender<BuildEvent>>,
) -> Result<Vec<(String, ThumbnailReport)>, PipelineError> {
    let mut reports = Vec::new();
    for name in select_folders(workspace, &options.only)? {
        let folder = workspace.folder(&name);
        let images = list_images(&folder.images_dir)?;
        if images.is_empty() {
            return Err(PipelineError::NoImages(folder.images_dir));
        }
        send(
            events,
            BuildEvent::FolderStarted {
                folder: name.clone(),
                image_count: images.len(),
            },
        );
        let report = create_thumbnails(backend, &folder, &images, options.force, events)?;
        tracing::info!(folder = %name, created = report.created, kept = report.kept, "Thumbnails done");
        reports.push((name, report));
    }
    Ok(reports)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
