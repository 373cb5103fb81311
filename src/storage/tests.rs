use super::*;
use crate::app::LauncherSelection;
use crate::config::{PicamConfig, StorageConfig};
use crate::error::{CaptureError, StorageError};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

fn create_test_config(root: &Path) -> StorageConfig {
    StorageConfig {
        root: root.to_string_lossy().to_string(),
        state_dir: root.join("state").to_string_lossy().to_string(),
        timezone: Some("UTC".to_string()),
        min_free_bytes: 0,
        ..PicamConfig::default().storage
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_missing_root_is_config_error() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir.path().join("does-not-exist"));

    match PhotoStore::open(&config, None) {
        Err(StorageError::MissingRoot { .. }) => {}
        other => panic!("expected MissingRoot, got {:?}", other.map(|s| s.root().to_path_buf())),
    }
}

#[test]
fn test_open_creates_layout_and_readme() {
    let dir = TempDir::new().unwrap();
    PhotoStore::open(&create_test_config(dir.path()), Some("dev-1234")).unwrap();

    assert!(dir.path().join(BY_DATE_DIR).is_dir());
    assert!(dir.path().join(ALL_PHOTOS_DIR).is_dir());
    assert!(dir.path().join(INCOMING_DIR).is_dir());

    let readme = fs::read_to_string(dir.path().join("README.txt")).unwrap();
    assert!(readme.contains("by_date/"));
    assert!(readme.contains("dev-1234"));
}

#[test]
fn test_store_places_photo_in_both_trees() {
    let dir = TempDir::new().unwrap();
    let store = PhotoStore::open(&create_test_config(dir.path()), None).unwrap();
    let at = store
        .timezone()
        .localize(UNIX_EPOCH + Duration::from_secs(1_710_028_799));

    let photo = store.store(&at, b"jpeg bytes").unwrap();

    assert_eq!(photo.date_folder, "2024-03-09");
    assert_eq!(
        photo.path,
        dir.path()
            .join(BY_DATE_DIR)
            .join("2024-03-09")
            .join("photo_20240309_235959_000.jpg")
    );
    assert_eq!(fs::read(&photo.path).unwrap(), b"jpeg bytes");
    assert_eq!(fs::read(&photo.all_photos_path).unwrap(), b"jpeg bytes");
    assert_eq!(photo.size_bytes, 10);
    assert!(files_in(&dir.path().join(INCOMING_DIR)).is_empty());
}

#[test]
fn test_name_collisions_get_suffix() {
    let dir = TempDir::new().unwrap();
    let store = PhotoStore::open(&create_test_config(dir.path()), None).unwrap();
    let at = store
        .timezone()
        .localize(UNIX_EPOCH + Duration::from_secs(1_710_028_799));

    let first = store.store(&at, b"one").unwrap();
    let second = store.store(&at, b"two").unwrap();

    assert_ne!(first.path, second.path);
    assert!(second
        .path
        .to_string_lossy()
        .ends_with("photo_20240309_235959_000_1.jpg"));
    assert_eq!(files_in(&dir.path().join(ALL_PHOTOS_DIR)).len(), 2);
}

#[test]
fn test_interrupted_write_leaves_nothing_visible() {
    let dir = TempDir::new().unwrap();
    let store = PhotoStore::open(&create_test_config(dir.path()), None).unwrap();
    let at = store
        .timezone()
        .localize(UNIX_EPOCH + Duration::from_secs(1_710_028_799));
    let date_dir = dir.path().join(BY_DATE_DIR).join("2024-03-09");

    let result = store.store_with(&at, |file| {
        file.write_all(b"half a jpe")?;
        // Mid-write: the visible trees hold nothing yet
        assert!(files_in(&date_dir).is_empty());
        assert!(files_in(&dir.path().join(ALL_PHOTOS_DIR)).is_empty());
        Err(std::io::Error::new(std::io::ErrorKind::Other, "encoder died"))
    });

    match result {
        Err(CaptureError::StorageWriteFailed { details, .. }) => {
            assert!(details.contains("encoder died"))
        }
        other => panic!("expected StorageWriteFailed, got {:?}", other),
    }
    assert!(files_in(&date_dir).is_empty());
    assert!(files_in(&dir.path().join(ALL_PHOTOS_DIR)).is_empty());
    assert!(files_in(&dir.path().join(INCOMING_DIR)).is_empty());
}

#[test]
fn test_stale_partials_removed_on_open() {
    let dir = TempDir::new().unwrap();
    let incoming = dir.path().join(INCOMING_DIR);
    fs::create_dir_all(&incoming).unwrap();
    fs::write(incoming.join("photo_x.jpg.partial"), b"junk").unwrap();

    PhotoStore::open(&create_test_config(dir.path()), None).unwrap();
    assert!(files_in(&incoming).is_empty());
}

#[test]
fn test_free_space_floor_reports_storage_full() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        min_free_bytes: u64::MAX,
        ..create_test_config(dir.path())
    };
    let store = PhotoStore::open(&config, None).unwrap();

    match store.check_free_space() {
        Err(CaptureError::StorageFull { .. }) => {}
        other => panic!("expected StorageFull, got {:?}", other),
    }
}

#[test]
fn test_all_photos_failure_rolls_back_by_date() {
    let dir = TempDir::new().unwrap();
    let store = PhotoStore::open(&create_test_config(dir.path()), None).unwrap();
    let at = store
        .timezone()
        .localize(UNIX_EPOCH + Duration::from_secs(1_710_028_799));
    let date_dir = dir.path().join(BY_DATE_DIR).join("2024-03-09");

    // Neither a hard link nor a copy can land under a plain file
    let all_photos = dir.path().join(ALL_PHOTOS_DIR);
    fs::remove_dir(&all_photos).unwrap();
    fs::write(&all_photos, b"not a directory").unwrap();

    match store.store(&at, b"jpeg bytes") {
        Err(CaptureError::StorageWriteFailed { .. }) => {}
        other => panic!("expected StorageWriteFailed, got {:?}", other),
    }
    assert!(files_in(&date_dir).is_empty());
    assert!(files_in(&dir.path().join(INCOMING_DIR)).is_empty());
}

#[test]
fn test_stats_count_photos() {
    let dir = TempDir::new().unwrap();
    let store = PhotoStore::open(&create_test_config(dir.path()), None).unwrap();

    store.store(&store.timezone().now(), b"today").unwrap();
    let old = store
        .timezone()
        .localize(UNIX_EPOCH + Duration::from_secs(1_600_000_000));
    store.store(&old, b"old").unwrap();

    let stats = store.stats();
    assert_eq!(stats.total_photos, 2);
    assert_eq!(stats.today_photos, 1);
    assert_eq!(stats.date_folders, 2);
    assert!(stats.free_bytes.is_some());
}

#[test]
fn test_state_round_trip() {
    let dir = TempDir::new().unwrap();

    let (mut state, created) = PersistedState::load(dir.path());
    assert!(created);
    assert!(!state.device_id.is_empty());

    state.launcher_selection = LauncherSelection::Settings;
    state.photos_taken = 7;
    state.save(dir.path()).unwrap();

    let (loaded, created) = PersistedState::load(dir.path());
    assert!(!created);
    assert_eq!(loaded, state);
}

#[test]
fn test_corrupt_state_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(STATE_FILE), "{ not json").unwrap();

    let (state, created) = PersistedState::load(dir.path());
    assert!(created);
    assert_eq!(state.photos_taken, 0);
    assert_eq!(state.launcher_selection, LauncherSelection::Camera);
}

#[test]
fn test_partial_state_keeps_known_fields() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(STATE_FILE),
        r#"{"device_id":"abc","photos_taken":3}"#,
    )
    .unwrap();

    let (state, _) = PersistedState::load(dir.path());
    assert_eq!(state.device_id, "abc");
    assert_eq!(state.photos_taken, 3);
    assert!(state.camera_overlay_visible);
}
