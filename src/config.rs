//! Build configuration.
//!
//! Handles loading and validating `gallery.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top, so a config
//! file only needs the keys it wants to change.
//!
//! ## Directory Layout
//!
//! ```text
//! site/
//! ├── gallery.toml
//! ├── gallery_images/          # images_root: one folder per month
//! │   ├── 202012/
//! │   │   ├── IMG_0001.jpg
//! │   │   └── IMG_0002.jpg
//! │   └── 202101/
//! │       └── ...
//! ├── gallery_thumbnails/      # thumbnails_root: mirrors images_root
//! │   └── 202101/IMG_0001.jpg
//! └── image_metadata/          # metadata_dir
//!     ├── 202012.json          # one manifest per folder
//!     ├── 202101.json
//!     └── gallery.json         # year/month index
//! ```
//!
//! Relative paths in the file are resolved against the directory containing
//! `gallery.toml`. Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, ThumbnailConfig};
use crate::store::DirStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name.
pub const CONFIG_FILENAME: &str = "gallery.toml";

/// Store key of the year/month index.
pub const INDEX_KEY: &str = "gallery.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Images directory not found: {0}")]
    MissingImagesRoot(PathBuf),
}

/// Contents of `gallery.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory holding one subdirectory of photos per month folder.
    pub images_root: String,
    /// Directory thumbnails are written to, mirroring `images_root`.
    pub thumbnails_root: String,
    /// Directory manifests and the folder index are written to.
    pub metadata_dir: String,
    /// Manifest `src`/`thumbnail` paths are relative to this directory.
    pub public_path: String,
    /// Thumbnail display height in pixels. Generated at twice this size.
    pub thumbnail_height: u32,
    /// strftime-style format for the display date. Empty disables dates.
    pub date_format: String,
    /// Folders to build. Empty means every subdirectory of `images_root`.
    pub folders: Vec<String>,
    /// JPEG quality for thumbnails (1-100).
    pub jpeg_quality: u32,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            images_root: "gallery_images".to_string(),
            thumbnails_root: "gallery_thumbnails".to_string(),
            metadata_dir: "image_metadata".to_string(),
            public_path: ".".to_string(),
            thumbnail_height: 160,
            date_format: "Photo Date: %d %B %Y %H:%M:%S".to_string(),
            folders: Vec::new(),
            jpeg_quality: 90,
            processing: ProcessingConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnail_height == 0 {
            return Err(ConfigError::Validation(
                "thumbnail_height must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(
                "jpeg_quality must be 1-100".into(),
            ));
        }
        for name in &self.folders {
            if !is_plain_folder_name(name) {
                return Err(ConfigError::Validation(format!(
                    "folders entry {name:?} must be a single directory name"
                )));
            }
        }
        Ok(())
    }

    /// The configured date format, if dates are enabled.
    pub fn date_format(&self) -> Option<&str> {
        Some(self.date_format.as_str()).filter(|f| !f.is_empty())
    }
}

pub(crate) fn is_plain_folder_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Settings for building one month folder.
#[derive(Debug, Clone)]
pub struct FolderConfig {
    /// Folder name, normally `YYYYMM`.
    pub name: String,
    pub images_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub public_path: PathBuf,
    pub thumbnail: ThumbnailConfig,
    pub date_format: Option<String>,
    /// Store key of this folder's manifest.
    pub manifest_key: String,
}

/// A loaded config together with the directory its relative paths hang off.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: BuildConfig,
    pub base_dir: PathBuf,
}

impl Workspace {
    pub fn new(config: BuildConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn images_root(&self) -> PathBuf {
        self.resolve(&self.config.images_root)
    }

    pub fn thumbnails_root(&self) -> PathBuf {
        self.resolve(&self.config.thumbnails_root)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.resolve(&self.config.metadata_dir)
    }

    pub fn public_path(&self) -> PathBuf {
        self.resolve(&self.config.public_path)
    }

    /// Store for manifests and the index, rooted at `metadata_dir`.
    pub fn store(&self) -> DirStore {
        DirStore::new(self.metadata_dir())
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            display_height: self.config.thumbnail_height,
            quality: Quality::new(self.config.jpeg_quality),
        }
    }

    /// Folders to build: the configured list, or every visible subdirectory
    /// of `images_root`, sorted by name.
    pub fn folder_names(&self) -> Result<Vec<String>, ConfigError> {
        if !self.config.folders.is_empty() {
            return Ok(self.config.folders.clone());
        }

        let root = self.images_root();
        if !root.is_dir() {
            return Err(ConfigError::MissingImagesRoot(root));
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Per-folder settings for `name`.
    pub fn folder(&self, name: &str) -> FolderConfig {
        FolderConfig {
            name: name.to_string(),
            images_dir: self.images_root().join(name),
            thumbnails_dir: self.thumbnails_root().join(name),
            public_path: self.public_path(),
            thumbnail: self.thumbnail_config(),
            date_format: self.config.date_format().map(str::to_string),
            manifest_key: format!("{name}.json"),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    // Every field of BuildConfig is representable in TOML
    toml::Value::try_from(BuildConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse config text, merge it over the stock defaults, and validate.
pub fn parse_config(content: &str) -> Result<BuildConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value(), overlay);
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `gallery.toml` from `path`.
///
/// A missing file yields the stock defaults; relative paths then resolve
/// against the directory the file would have been in.
pub fn load_config(path: &Path) -> Result<Workspace, ConfigError> {
    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let config = if path.exists() {
        parse_config(&fs::read_to_string(path)?)?
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        BuildConfig::default()
    };
    Ok(Workspace::new(config, base_dir))
}

/// Returns a fully-commented stock `gallery.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gallery-build configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory of this file.
# Unknown keys will cause an error.

# One subdirectory of photos per month folder (named YYYYMM).
images_root = "gallery_images"

# Thumbnails are written here, one subdirectory per folder.
thumbnails_root = "gallery_thumbnails"

# Manifests (<folder>.json) and the year/month index (gallery.json).
metadata_dir = "image_metadata"

# Image and thumbnail paths in the manifests are relative to this directory.
public_path = "."

# Thumbnail display height in pixels. Files are generated at twice this
# height for high-density screens.
thumbnail_height = 160

# strftime-style format for the caption date. Set to "" to disable.
date_format = "Photo Date: %d %B %Y %H:%M:%S"

# Folders to build. Leave empty to build every subdirectory of images_root.
folders = []

# JPEG quality for thumbnails (1 = worst, 100 = best).
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel thumbnail workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
