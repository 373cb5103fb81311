use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Ask for one still photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub requested_at: SystemTime,
}

impl CaptureRequest {
    pub fn now() -> Self {
        Self {
            requested_at: SystemTime::now(),
        }
    }
}

/// A photo written to the shared tree. Never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    /// Final path under `by_date/<date>/`
    pub path: PathBuf,
    /// Link or copy under `all_photos/`
    pub all_photos_path: PathBuf,
    /// Sensor timestamp in the store's timezone
    pub captured_at: DateTime<FixedOffset>,
    /// Calendar date of `captured_at`, `YYYY-MM-DD`
    pub date_folder: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CaptureStats {
    pub captures_completed: u64,
    pub captures_failed: u64,
    pub busy_rejections: u64,
    pub last_capture_duration: Option<Duration>,
}
