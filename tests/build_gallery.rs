//! End-to-end builds with the real image backend on a temporary site.

mod common;

use common::{DAY, JAN_1_2021, set_mtime, write_jpeg};
use gallery_build::config::{self, CONFIG_FILENAME, Workspace};
use gallery_build::imaging::RustBackend;
use gallery_build::manifest::GalleryManifest;
use gallery_build::pipeline::{self, BuildOptions, PipelineError};
use gallery_build::store::MetadataStore;
use gallery_build::view::{GalleryPage, PrefixResolver, gallery_listing};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

fn site(tmp: &TempDir, config: &str) -> Workspace {
    let path = tmp.path().join(CONFIG_FILENAME);
    fs::write(&path, config).unwrap();
    config::load_config(&path).unwrap()
}

fn build(ws: &Workspace) -> Result<pipeline::BuildSummary, PipelineError> {
    build_with(ws, &BuildOptions::default())
}

fn build_with(
    ws: &Workspace,
    options: &BuildOptions,
) -> Result<pipeline::BuildSummary, PipelineError> {
    pipeline::run(&RustBackend::new(), &ws.store(), ws, options, None)
}

fn modified(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

fn read_manifest(ws: &Workspace, folder: &str) -> GalleryManifest {
    let bytes = ws.store().read(&format!("{folder}.json")).unwrap().unwrap();
    GalleryManifest::from_json(&bytes).unwrap()
}

fn images(ws: &Workspace, folder: &str) -> PathBuf {
    ws.images_root().join(folder)
}

// =============================================================================
// Full build
// =============================================================================

#[test]
fn build_writes_thumbnails_manifests_and_index() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    write_jpeg(&images(&ws, "202101").join("a.jpg"), 64, 48, Some("2021:01:01 10:00:00"));
    write_jpeg(&images(&ws, "202101").join("b.jpg"), 48, 64, Some("2021:01:02 10:00:00"));
    write_jpeg(&images(&ws, "202012").join("x.jpg"), 40, 40, None);

    let summary = build(&ws).unwrap();

    assert_eq!(summary.folders.len(), 2);
    let thumb = ws.thumbnails_root().join("202101/a.jpg");
    assert_eq!(image::image_dimensions(&thumb).unwrap(), (427, 320));

    let manifest = read_manifest(&ws, "202101");
    let a = manifest.get("a.jpg").unwrap();
    let b = manifest.get("b.jpg").unwrap();
    assert_eq!(a.src, "gallery_images/202101/a.jpg");
    assert_eq!(a.thumbnail, "gallery_thumbnails/202101/a.jpg");
    assert_eq!(a.size, (64, 48));
    assert_eq!(a.thumbnail_size, (214, 160));
    assert_eq!(b.thumbnail_size, (120, 160));
    assert_eq!(a.date, "Photo Date: 01 January 2021 10:00:00");
    assert_eq!(a.description, " ");
    assert!(a.unix_time < b.unix_time);

    let index: serde_json::Value =
        serde_json::from_slice(&ws.store().read("gallery.json").unwrap().unwrap()).unwrap();
    assert_eq!(
        index,
        serde_json::json!([
            { "year": 2021, "months": ["202101"] },
            { "year": 2020, "months": ["202012"] }
        ])
    );
}

#[test]
fn listing_follows_capture_time_not_filename() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    let dir = images(&ws, "202101");
    // Names sort a, b, c; captures run c, b, a
    write_jpeg(&dir.join("a.jpg"), 32, 32, None);
    write_jpeg(&dir.join("b.jpg"), 32, 32, None);
    write_jpeg(&dir.join("c.jpg"), 32, 32, Some("2021:01:01 08:00:00"));
    set_mtime(&dir.join("a.jpg"), JAN_1_2021 + 3 * DAY);
    set_mtime(&dir.join("b.jpg"), JAN_1_2021 + 2 * DAY);

    build(&ws).unwrap();

    let manifest = read_manifest(&ws, "202101");
    let names: Vec<String> = gallery_listing(&manifest)
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["c.jpg", "b.jpg", "a.jpg"]);
    assert_eq!(
        manifest.get("b.jpg").unwrap().unix_time,
        (JAN_1_2021 + 2 * DAY) as f64
    );

    let page = GalleryPage::build("202101", &manifest, &PrefixResolver::new("/media")).unwrap();
    assert_eq!(
        page.background_photo.as_deref(),
        Some("/media/gallery_images/202101/c.jpg")
    );
}

// =============================================================================
// Rebuilds
// =============================================================================

#[test]
fn rebuild_is_byte_identical_and_reuses_thumbnails() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    write_jpeg(&images(&ws, "202101").join("a.jpg"), 64, 48, Some("2021:01:05 12:00:00"));
    write_jpeg(&images(&ws, "202101").join("b.jpg"), 64, 48, None);

    build(&ws).unwrap();
    let manifest_path = ws.metadata_dir().join("202101.json");
    let first = fs::read(&manifest_path).unwrap();
    let index_first = fs::read(ws.metadata_dir().join("gallery.json")).unwrap();
    let thumb = ws.thumbnails_root().join("202101/a.jpg");
    let thumb_bytes = fs::read(&thumb).unwrap();
    // Backdate so a rewrite would show up regardless of timestamp resolution
    set_mtime(&thumb, JAN_1_2021);

    let summary = build(&ws).unwrap();

    assert_eq!(fs::read(&manifest_path).unwrap(), first);
    assert_eq!(
        fs::read(ws.metadata_dir().join("gallery.json")).unwrap(),
        index_first
    );
    assert_eq!(summary.folders[0].thumbnails_created, 0);
    assert_eq!(summary.folders[0].thumbnails_kept, 2);
    assert_eq!(fs::read(&thumb).unwrap(), thumb_bytes);
    assert_eq!(modified(&thumb), UNIX_EPOCH + Duration::from_secs(JAN_1_2021));
}

#[test]
fn forced_rebuild_rewrites_thumbnails() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    write_jpeg(&images(&ws, "202101").join("a.jpg"), 64, 48, None);
    build(&ws).unwrap();
    let thumb = ws.thumbnails_root().join("202101/a.jpg");
    set_mtime(&thumb, JAN_1_2021);

    let summary = build_with(
        &ws,
        &BuildOptions {
            force: true,
            ..BuildOptions::default()
        },
    )
    .unwrap();

    assert_eq!(summary.folders[0].thumbnails_created, 1);
    assert_eq!(summary.folders[0].thumbnails_kept, 0);
    assert!(modified(&thumb) > UNIX_EPOCH + Duration::from_secs(JAN_1_2021));
    assert_eq!(image::image_dimensions(&thumb).unwrap(), (427, 320));
}

#[test]
fn changed_thumbnail_height_regenerates() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    write_jpeg(&images(&ws, "202101").join("a.jpg"), 64, 48, None);
    build(&ws).unwrap();

    let ws = site(&tmp, "thumbnail_height = 100\n");
    let summary = build(&ws).unwrap();

    assert_eq!(summary.folders[0].thumbnails_created, 1);
    let thumb = ws.thumbnails_root().join("202101/a.jpg");
    assert_eq!(image::image_dimensions(&thumb).unwrap().1, 200);
    assert_eq!(read_manifest(&ws, "202101").get("a.jpg").unwrap().thumbnail_size.1, 100);
}

#[test]
fn hand_written_caption_survives_rebuild() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    let photo = images(&ws, "202101").join("a.jpg");
    write_jpeg(&photo, 64, 48, Some("2021:01:01 10:00:00"));
    build(&ws).unwrap();

    let manifest_path = ws.metadata_dir().join("202101.json");
    let text = fs::read_to_string(&manifest_path).unwrap();
    fs::write(
        &manifest_path,
        text.replace("\"description\": \" \"", "\"description\": \"First snow\""),
    )
    .unwrap();

    build(&ws).unwrap();
    assert_eq!(
        read_manifest(&ws, "202101").get("a.jpg").unwrap().description,
        "First snow"
    );

    // Re-exported photo: the old caption no longer applies
    write_jpeg(&photo, 64, 48, Some("2021:01:01 10:00:00"));
    set_mtime(&photo, JAN_1_2021 + 30 * DAY);
    build(&ws).unwrap();
    assert_eq!(
        read_manifest(&ws, "202101").get("a.jpg").unwrap().description,
        " "
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn corrupt_image_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    let dir = images(&ws, "202101");
    write_jpeg(&dir.join("a.jpg"), 32, 32, None);
    fs::write(dir.join("broken.jpg"), b"not a jpeg at all").unwrap();

    let summary = build(&ws).unwrap();

    assert_eq!(summary.folders[0].skipped, 1);
    let manifest = read_manifest(&ws, "202101");
    assert!(manifest.get("a.jpg").is_some());
    assert!(manifest.get("broken.jpg").is_none());
}

#[test]
fn unwritable_thumbnail_aborts_build() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    write_jpeg(&images(&ws, "202101").join("a.jpg"), 32, 32, None);
    write_jpeg(&images(&ws, "202101").join("b.jpg"), 32, 32, None);
    fs::create_dir_all(ws.thumbnails_root().join("202101/a.jpg")).unwrap();

    let result = build(&ws);

    match result {
        Err(PipelineError::Thumbnail { path, .. }) => {
            assert_eq!(path, ws.thumbnails_root().join("202101/a.jpg"));
        }
        other => panic!("expected a thumbnail write error, got {other:?}"),
    }
    assert!(!ws.metadata_dir().join("202101.json").exists());
    assert!(!ws.metadata_dir().join("gallery.json").exists());
}

#[test]
fn photos_sharing_a_thumbnail_name_keep_the_first() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    let dir = images(&ws, "202101");
    write_jpeg(&dir.join("a.jpg"), 64, 48, None);
    let tall = image::RgbImage::from_pixel(30, 90, image::Rgb([10, 120, 200]));
    tall.save(dir.join("a.png")).unwrap();

    for _ in 0..3 {
        let summary = build(&ws).unwrap();
        assert_eq!(summary.folders[0].skipped, 1);

        let manifest = read_manifest(&ws, "202101");
        assert!(manifest.get("a.png").is_none());
        assert_eq!(manifest.get("a.jpg").unwrap().thumbnail_size, (214, 160));
        let thumb = ws.thumbnails_root().join("202101/a.jpg");
        assert_eq!(image::image_dimensions(&thumb).unwrap(), (427, 320));
    }
}

#[test]
fn empty_folder_aborts_before_index() {
    let tmp = TempDir::new().unwrap();
    let ws = site(&tmp, "");
    write_jpeg(&images(&ws, "202101").join("a.jpg"), 32, 32, None);
    fs::create_dir_all(images(&ws, "202102")).unwrap();
    fs::write(images(&ws, "202102").join("notes.txt"), b"todo").unwrap();

    let result = build(&ws);

    assert!(matches!(result, Err(PipelineError::NoImages(_))));
    assert!(ws.metadata_dir().join("202101.json").exists());
    assert!(!ws.metadata_dir().join("202102.json").exists());
    assert!(!ws.metadata_dir().join("gallery.json").exists());
}

#[test]
fn configured_folders_and_paths_are_honoured() {
    let tmp = TempDir::new().unwrap();
    let ws = site(
        &tmp,
        "images_root = \"photos\"\nmetadata_dir = \"meta\"\nfolders = [\"202103\"]\ndate_format = \"\"\n",
    );
    write_jpeg(&tmp.path().join("photos/202103/a.jpg"), 32, 32, None);
    // Not listed in `folders`, so never built
    fs::create_dir_all(tmp.path().join("photos/202104")).unwrap();

    build(&ws).unwrap();

    assert!(tmp.path().join("meta/202103.json").exists());
    let manifest = read_manifest(&ws, "202103");
    let record = manifest.get("a.jpg").unwrap();
    assert_eq!(record.src, "photos/202103/a.jpg");
    assert_eq!(record.date, "");
    assert_eq!(record.description, "");
}
