use super::*;
use crate::camera::{MockSensor, MockSensorControl};
use crate::config::{PicamConfig, StorageConfig};
use crate::error::CaptureError;
use crate::events::{EventBus, PicamEvent};
use crate::storage::PhotoStore;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

const LAST_SECOND_OF_DAY: u64 = 1_710_028_799;

fn create_test_config(root: &std::path::Path) -> StorageConfig {
    StorageConfig {
        root: root.to_string_lossy().to_string(),
        state_dir: root.join("state").to_string_lossy().to_string(),
        timezone: Some("UTC".to_string()),
        min_free_bytes: 0,
        ..PicamConfig::default().storage
    }
}

fn create_test_pipeline(
    dir: &TempDir,
    still_latency: Duration,
) -> (CapturePipeline, MockSensorControl) {
    let sensor = MockSensor::new((16, 12), (64, 48)).with_still_latency(still_latency);
    let control = sensor.control();
    let store = PhotoStore::open(&create_test_config(dir.path()), None).unwrap();
    (CapturePipeline::new(Box::new(sensor), store, 85), control)
}

#[tokio::test]
async fn test_capture_writes_jpeg_in_both_trees() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _control) = create_test_pipeline(&dir, Duration::ZERO);

    let photo = pipeline.capture(CaptureRequest::now()).await.unwrap();

    let bytes = fs::read(&photo.path).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    assert_eq!(bytes.len() as u64, photo.size_bytes);
    assert_eq!(fs::read(&photo.all_photos_path).unwrap(), bytes);
    assert!(!pipeline.is_busy());
    assert_eq!(pipeline.stats().captures_completed, 1);
}

#[tokio::test]
async fn test_back_to_back_capture_is_rejected_as_busy() {
    let dir = TempDir::new().unwrap();
    let (pipeline, control) = create_test_pipeline(&dir, Duration::from_millis(150));

    let (first, second) = tokio::join!(
        pipeline.capture(CaptureRequest::now()),
        pipeline.capture(CaptureRequest::now())
    );

    assert!(first.is_ok());
    assert_eq!(second, Err(CaptureError::SensorBusy));
    assert_eq!(control.stills_captured(), 1);

    let stats = pipeline.stats();
    assert_eq!(stats.captures_completed, 1);
    assert_eq!(stats.busy_rejections, 1);

    // The busy flag is gone once the first capture resolved
    assert!(pipeline.capture(CaptureRequest::now()).await.is_ok());
}

#[tokio::test]
async fn test_date_folder_follows_capture_timestamp_across_midnight() {
    let dir = TempDir::new().unwrap();
    let (pipeline, control) = create_test_pipeline(&dir, Duration::ZERO);

    control.set_still_timestamp(UNIX_EPOCH + Duration::from_secs(LAST_SECOND_OF_DAY));
    let before = pipeline.capture(CaptureRequest::now()).await.unwrap();

    control.set_still_timestamp(UNIX_EPOCH + Duration::from_secs(LAST_SECOND_OF_DAY + 1));
    let after = pipeline.capture(CaptureRequest::now()).await.unwrap();

    assert_eq!(before.date_folder, "2024-03-09");
    assert_eq!(before.captured_at.format("%Y-%m-%d").to_string(), before.date_folder);
    assert!(before.path.parent().unwrap().ends_with("2024-03-09"));

    assert_eq!(after.date_folder, "2024-03-10");
    assert_eq!(after.captured_at.format("%Y-%m-%d").to_string(), after.date_folder);
    assert!(after
        .path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("photo_20240310_000000"));
}

#[tokio::test]
async fn test_sensor_fault_is_reported_and_preview_resumes() {
    let dir = TempDir::new().unwrap();
    let (pipeline, control) = create_test_pipeline(&dir, Duration::ZERO);
    let mut preview = pipeline.start_preview().unwrap();
    assert!(preview.poll_frame().unwrap().is_some());

    control.fail_next_capture("csi timeout");
    match pipeline.capture(CaptureRequest::now()).await {
        Err(CaptureError::SensorFault { details }) => assert_eq!(details, "csi timeout"),
        other => panic!("expected sensor fault, got {:?}", other),
    }

    assert!(control.is_previewing());
    assert!(preview.poll_frame().unwrap().is_some());
    assert_eq!(pipeline.stats().captures_failed, 1);
    assert!(pipeline.store().stats().total_photos == 0);
}

#[tokio::test]
async fn test_storage_full_rejects_capture() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        min_free_bytes: u64::MAX,
        ..create_test_config(dir.path())
    };
    let sensor = MockSensor::new((16, 12), (64, 48));
    let control = sensor.control();
    let store = PhotoStore::open(&config, None).unwrap();
    let pipeline = CapturePipeline::new(Box::new(sensor), store, 85);

    let result = pipeline.capture(CaptureRequest::now()).await;
    assert!(matches!(result, Err(CaptureError::StorageFull { .. })));
    assert_eq!(control.stills_captured(), 0);
}

#[tokio::test]
async fn test_preview_pauses_during_capture() {
    let dir = TempDir::new().unwrap();
    let (pipeline, control) = create_test_pipeline(&dir, Duration::from_millis(200));
    let mut preview = pipeline.start_preview().unwrap();
    assert!(preview.poll_frame().unwrap().is_some());

    let mut ticket = pipeline.submit(CaptureRequest::now());
    assert!(pipeline.is_busy());
    assert!(preview.poll_frame().unwrap().is_none());
    assert!(ticket.try_take().is_none());

    ticket.wait().await.unwrap();
    assert!(!pipeline.is_busy());
    assert!(preview.poll_frame().unwrap().is_some());
    assert_eq!(control.preview_starts(), 2);
    assert!(preview.frames_received() >= 2);
}

#[tokio::test]
async fn test_dropping_preview_stops_sensor() {
    let dir = TempDir::new().unwrap();
    let (pipeline, control) = create_test_pipeline(&dir, Duration::ZERO);

    let preview = pipeline.start_preview().unwrap();
    assert!(control.is_previewing());
    drop(preview);
    assert!(!control.is_previewing());

    // Nobody is watching, so the capture leaves the preview off
    pipeline.capture(CaptureRequest::now()).await.unwrap();
    assert!(!control.is_previewing());
}

#[tokio::test]
async fn test_capture_events_published() {
    let dir = TempDir::new().unwrap();
    let bus = Arc::new(EventBus::new(16));
    let mut events = bus.subscribe();
    let (pipeline, _control) = create_test_pipeline(&dir, Duration::ZERO);
    let pipeline = pipeline.with_event_bus(Arc::clone(&bus));

    let photo = pipeline.capture(CaptureRequest::now()).await.unwrap();

    assert!(matches!(
        events.recv().await.unwrap(),
        PicamEvent::CaptureStarted { .. }
    ));
    match events.recv().await.unwrap() {
        PicamEvent::CaptureCompleted { path } => assert_eq!(path, photo.path),
        other => panic!("unexpected event {:?}", other),
    }
}
