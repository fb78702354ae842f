//! Folder-level thumbnail generation.
//!
//! Runs [`ensure_thumbnail`] for every image of one folder on the rayon pool.
//! Jobs are independent; results are collected in input order before anything
//! is reported, so progress output is stable between runs.
//!
//! Thumbnails are named after the source up to its first dot, so `a.jpg` and
//! `a.png` would share one file. Before any job starts, the first image in
//! filename order claims each thumbnail name and later ones are skipped.
//!
//! A source that can't be decoded is logged and skipped; the manifest step
//! skips it as well. Failing to write a thumbnail is fatal for the folder.

use crate::config::FolderConfig;
use crate::imaging::{BackendError, ImageBackend, ThumbnailOutcome, ensure_thumbnail, thumbnail_path};
use crate::pipeline::{BuildEvent, PipelineError, ThumbnailStatus};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// What happened to a folder's thumbnails.
#[derive(Debug, Default)]
pub struct ThumbnailReport {
    /// Newly written thumbnails.
    pub created: usize,
    /// Existing thumbnails that already had the right height.
    pub kept: usize,
    /// Source images whose thumbnail could not be produced.
    pub failed: Vec<(PathBuf, BackendError)>,
    /// Source images skipped because an earlier image claimed the same
    /// thumbnail name, paired with that earlier image.
    pub collisions: Vec<(PathBuf, PathBuf)>,
}

impl ThumbnailReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Sources that ended up without a thumbnail of their own.
    pub fn without_thumbnail(&self) -> impl Iterator<Item = &Path> {
        self.failed
            .iter()
            .map(|(p, _)| p.as_path())
            .chain(self.collisions.iter().map(|(p, _)| p.as_path()))
    }
}

/// Split `images` into jobs with distinct thumbnail paths and the collisions.
///
/// `images` is expected in filename order; the first image to reach a
/// thumbnail path keeps it.
pub fn assign_thumbnails(
    thumbnails_dir: &Path,
    images: &[PathBuf],
) -> (Vec<(PathBuf, PathBuf)>, Vec<(PathBuf, PathBuf)>) {
    let mut owners: HashMap<PathBuf, &PathBuf> = HashMap::new();
    let mut jobs = Vec::with_capacity(images.len());
    let mut collisions = Vec::new();
    for source in images {
        let output = thumbnail_path(thumbnails_dir, source);
        match owners.get(&output) {
            Some(owner) => collisions.push((source.clone(), (*owner).clone())),
            None => {
                owners.insert(output.clone(), source);
                jobs.push((source.clone(), output));
            }
        }
    }
    (jobs, collisions)
}

/// Create or refresh the thumbnails of `images` under the folder's thumbnail
/// directory.
///
/// Returns [`PipelineError::Thumbnail`] for the first image, in input order,
/// whose thumbnail could not be written.
pub fn create_thumbnails(
    backend: &impl ImageBackend,
    folder: &FolderConfig,
    images: &[PathBuf],
    force: bool,
    events: Option<&Sender<BuildEvent>>,
) -> Result<ThumbnailReport, PipelineError> {
    let (jobs, collisions) = assign_thumbnails(&folder.thumbnails_dir, images);

    let mut report = ThumbnailReport::default();
    for (source, owner) in collisions {
        let filename = file_name(&source);
        let reason = format!("thumbnail name collides with {}", file_name(&owner));
        tracing::warn!(file = %source.display(), %reason, "Skipping image");
        if let Some(tx) = events {
            tx.send(BuildEvent::ImageSkipped {
                folder: folder.name.clone(),
                filename,
                reason,
            })
            .ok();
        }
        report.collisions.push((source, owner));
    }

    let results: Vec<(&Path, &Path, Result<ThumbnailOutcome, BackendError>)> = jobs
        .par_iter()
        .map(|(source, output)| {
            let outcome = ensure_thumbnail(backend, source, output, &folder.thumbnail, force);
            (source.as_path(), output.as_path(), outcome)
        })
        .collect();

    for (source, output, result) in results {
        let filename = file_name(source);
        let status = match result {
            Ok(ThumbnailOutcome::Created(dims)) => {
                tracing::debug!(file = %filename, width = dims.width, height = dims.height, "Thumbnail created");
                report.created += 1;
                ThumbnailStatus::Created
            }
            Ok(ThumbnailOutcome::Kept(_)) => {
                tracing::debug!(file = %filename, "Thumbnail up to date");
                report.kept += 1;
                ThumbnailStatus::Kept
            }
            Err(e) if e.is_write_failure() => {
                tracing::error!(file = %output.display(), error = %e, "Cannot write thumbnail");
                return Err(PipelineError::Thumbnail {
                    path: output.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!(file = %source.display(), error = %e, "Thumbnail failed, skipping image");
                let status = ThumbnailStatus::Failed(e.to_string());
                report.failed.push((source.to_path_buf(), e));
                status
            }
        };
        if let Some(tx) = events {
            tx.send(BuildEvent::Thumbnail {
                folder: folder.name.clone(),
                filename,
                status,
            })
            .ok();
        }
    }
    Ok(report)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
