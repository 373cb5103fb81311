use super::encode::encode_jpeg;
use super::types::{CaptureRequest, CaptureStats, Photo};
use crate::camera::CameraSensor;
use crate::error::CaptureError;
use crate::events::{EventBus, PicamEvent};
use crate::frame::FrameData;
use crate::storage::PhotoStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

type SharedSensor = Arc<Mutex<Box<dyn CameraSensor>>>;

/// Clears the busy flag when the capture worker finishes, however it finishes
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Result slot for one submitted capture
pub struct CaptureTicket {
    receiver: oneshot::Receiver<Result<Photo, CaptureError>>,
    requested_at: Instant,
}

impl CaptureTicket {
    fn resolved(result: Result<Photo, CaptureError>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);
        Self {
            receiver,
            requested_at: Instant::now(),
        }
    }

    /// Non-blocking check used by the UI loop
    pub fn try_take(&mut self) -> Option<Result<Photo, CaptureError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(CaptureError::sensor_fault(
                "capture worker exited without a result",
            ))),
        }
    }

    pub async fn wait(self) -> Result<Photo, CaptureError> {
        self.receiver.await.unwrap_or_else(|_| {
            Err(CaptureError::sensor_fault(
                "capture worker exited without a result",
            ))
        })
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.requested_at.elapsed()
    }
}

/// Owns the camera sensor: live preview for the viewfinder and serialized still capture
pub struct CapturePipeline {
    sensor: SharedSensor,
    store: Arc<PhotoStore>,
    busy: Arc<AtomicBool>,
    preview_wanted: Arc<AtomicBool>,
    jpeg_quality: u8,
    stats: Arc<Mutex<CaptureStats>>,
    event_bus: Option<Arc<EventBus>>,
}

impl CapturePipeline {
    pub fn new(sensor: Box<dyn CameraSensor>, store: PhotoStore, jpeg_quality: u8) -> Self {
        info!(
            "Capture pipeline on {} sensor, photos under {}",
            sensor.name(),
            store.root().display()
        );
        Self {
            sensor: Arc::new(Mutex::new(sensor)),
            store: Arc::new(store),
            busy: Arc::new(AtomicBool::new(false)),
            preview_wanted: Arc::new(AtomicBool::new(false)),
            jpeg_quality,
            stats: Arc::new(Mutex::new(CaptureStats::default())),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    /// True while a capture is in flight. Only the pipeline writes this flag.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats.lock().clone()
    }

    /// Capture one still and place it in the photo tree.
    ///
    /// A call made while another capture is in flight fails with
    /// `SensorBusy` and leaves the running capture alone.
    pub async fn capture(&self, request: CaptureRequest) -> Result<Photo, CaptureError> {
        self.submit(request).wait().await
    }

    /// Start a capture on a blocking worker and return its result slot.
    ///
    /// The busy flag is claimed before this returns, so a second submit
    /// from the same loop iteration is rejected. Dropping the ticket does
    /// not cancel the capture.
    pub fn submit(&self, request: CaptureRequest) -> CaptureTicket {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.stats.lock().busy_rejections += 1;
            debug!("Capture rejected: sensor busy");
            return CaptureTicket::resolved(Err(CaptureError::SensorBusy));
        }

        let guard = BusyGuard(Arc::clone(&self.busy));
        let (sender, receiver) = oneshot::channel();
        let worker = CaptureWorker {
            sensor: Arc::clone(&self.sensor),
            store: Arc::clone(&self.store),
            preview_wanted: Arc::clone(&self.preview_wanted),
            jpeg_quality: self.jpeg_quality,
        };
        let stats = Arc::clone(&self.stats);
        let event_bus = self.event_bus.clone();

        if let Some(bus) = &event_bus {
            let _ = bus.publish(PicamEvent::CaptureStarted {
                requested_at: request.requested_at,
            });
        }

        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = worker.run();
            let elapsed = started.elapsed();

            {
                let mut stats = stats.lock();
                stats.last_capture_duration = Some(elapsed);
                match &result {
                    Ok(_) => stats.captures_completed += 1,
                    Err(_) => stats.captures_failed += 1,
                }
            }

            match &result {
                Ok(photo) => {
                    info!(
                        "Captured {} ({} bytes) in {:?}",
                        photo.path.display(),
                        photo.size_bytes,
                        elapsed
                    );
                    if let Some(bus) = &event_bus {
                        let _ = bus.publish(PicamEvent::CaptureCompleted {
                            path: photo.path.clone(),
                        });
                    }
                }
                Err(e) => {
                    error!("Capture failed: {}", e);
                    if let Some(bus) = &event_bus {
                        let _ = bus.publish(PicamEvent::CaptureFailed {
                            error: e.to_string(),
                        });
                    }
                }
            }

            // Free the sensor before anyone hears about the result
            drop(guard);
            let _ = sender.send(result);
        });

        CaptureTicket {
            receiver,
            requested_at: Instant::now(),
        }
    }

    /// Begin streaming preview frames for the viewfinder
    pub fn start_preview(&self) -> Result<PreviewStream, CaptureError> {
        self.preview_wanted.store(true, Ordering::Release);

        // A running capture restarts the preview itself when it finishes
        if let Some(mut sensor) = self.sensor.try_lock() {
            sensor.start_preview()?;
        }

        Ok(PreviewStream {
            sensor: Arc::clone(&self.sensor),
            busy: Arc::clone(&self.busy),
            preview_wanted: Arc::clone(&self.preview_wanted),
            frames: 0,
        })
    }

    /// Stop the sensor before shutdown; waits for an in-flight capture
    pub fn shutdown(&self) {
        self.preview_wanted.store(false, Ordering::Release);
        let mut sensor = self.sensor.lock();
        if let Err(e) = sensor.stop_preview() {
            warn!("Failed to stop preview during shutdown: {}", e);
        }
    }
}

struct CaptureWorker {
    sensor: SharedSensor,
    store: Arc<PhotoStore>,
    preview_wanted: Arc<AtomicBool>,
    jpeg_quality: u8,
}

impl CaptureWorker {
    fn run(self) -> Result<Photo, CaptureError> {
        self.store.check_free_space()?;

        let mut sensor = self.sensor.lock();
        if sensor.is_previewing() {
            sensor.stop_preview()?;
        }

        let result = sensor
            .capture_still()
            .and_then(|frame| self.write_photo(&frame));

        if self.preview_wanted.load(Ordering::Acquire) {
            if let Err(e) = sensor.start_preview() {
                warn!("Failed to resume preview after capture: {}", e);
            }
        }

        result
    }

    fn write_photo(&self, frame: &FrameData) -> Result<Photo, CaptureError> {
        let captured_at = self.store.timezone().localize(frame.timestamp);
        let stored = self
            .store
            .store_with(&captured_at, |file| encode_jpeg(frame, self.jpeg_quality, file))?;

        Ok(Photo {
            path: stored.path,
            all_photos_path: stored.all_photos_path,
            captured_at,
            date_folder: stored.date_folder,
            size_bytes: stored.size_bytes,
        })
    }
}

/// Live viewfinder frames. Dropping the stream stops the sensor preview.
pub struct PreviewStream {
    sensor: SharedSensor,
    busy: Arc<AtomicBool>,
    preview_wanted: Arc<AtomicBool>,
    frames: u64,
}

impl PreviewStream {
    /// Next frame if one is ready. Yields nothing while a capture holds the sensor.
    pub fn poll_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        if self.busy.load(Ordering::Acquire) {
            return Ok(None);
        }
        let Some(mut sensor) = self.sensor.try_lock() else {
            return Ok(None);
        };
        let frame = sensor.preview_frame()?;
        if frame.is_some() {
            self.frames += 1;
        }
        Ok(frame)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames
    }
}

impl Drop for PreviewStream {
    fn drop(&mut self) {
        self.preview_wanted.store(false, Ordering::Release);
        // If a capture holds the sensor it leaves the preview off when done
        if let Some(mut sensor) = self.sensor.try_lock() {
            if let Err(e) = sensor.stop_preview() {
                warn!("Failed to stop preview: {}", e);
            } else {
                debug!("Preview stopped after {} frames", self.frames);
            }
        }
    }
}
