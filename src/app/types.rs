use crate::capture::CaptureRequest;
use crate::storage::StorageStats;
use crate::wifi::{ScanState, WifiStatus};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The one screen that owns the display and receives input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppScreen {
    Launcher,
    CameraApp,
    SettingsApp,
}

impl fmt::Display for AppScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppScreen::Launcher => "launcher",
            AppScreen::CameraApp => "camera",
            AppScreen::SettingsApp => "settings",
        };
        f.write_str(name)
    }
}

/// Launcher tile under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LauncherSelection {
    #[default]
    Camera,
    Settings,
}

impl LauncherSelection {
    pub fn toggled(self) -> Self {
        match self {
            LauncherSelection::Camera => LauncherSelection::Settings,
            LauncherSelection::Settings => LauncherSelection::Camera,
        }
    }

    pub fn screen(self) -> AppScreen {
        match self {
            LauncherSelection::Camera => AppScreen::CameraApp,
            LauncherSelection::Settings => AppScreen::SettingsApp,
        }
    }
}

/// Side effects an app asks the runtime to perform
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    StartPreview,
    StopPreview,
    Capture(CaptureRequest),
    ScanWifi,
    PersistState,
    SetBacklight(bool),
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest(String),
    Error(String),
}

/// UI timings taken from the display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiTiming {
    /// Launcher idle time before sleeping, `None` never sleeps
    pub sleep_after: Option<Duration>,
    /// Camera overlay auto-hide, `None` keeps it up
    pub overlay_timeout: Option<Duration>,
    pub saved_banner: Duration,
    pub busy_banner: Duration,
    pub error_banner: Duration,
}

impl UiTiming {
    pub fn from_config(display: &crate::config::DisplayConfig) -> Self {
        let non_zero = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        Self {
            sleep_after: non_zero(display.sleep_after_seconds),
            overlay_timeout: non_zero(display.ui_timeout_seconds),
            ..Self::default()
        }
    }
}

impl Default for UiTiming {
    fn default() -> Self {
        Self {
            sleep_after: Some(Duration::from_secs(300)),
            overlay_timeout: Some(Duration::from_secs(5)),
            saved_banner: Duration::from_millis(1500),
            busy_banner: Duration::from_secs(2),
            error_banner: Duration::from_secs(3),
        }
    }
}

/// Fixed facts shown on the settings pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub version: String,
    pub device_id: String,
    pub share_path: String,
    pub camera_lines: Vec<String>,
    pub display_lines: Vec<String>,
}

/// Frequently refreshed facts read by every screen while rendering
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub clock: DateTime<FixedOffset>,
    pub wifi: WifiStatus,
    pub scan: ScanState,
    pub storage: StorageStats,
    pub system: super::system_info::SystemInfo,
}

impl StatusSnapshot {
    pub fn new(clock: DateTime<FixedOffset>) -> Self {
        Self {
            clock,
            wifi: WifiStatus::default(),
            scan: ScanState::Idle,
            storage: StorageStats::default(),
            system: Default::default(),
        }
    }
}

/// Everything a screen reads while drawing one frame
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub status: &'a StatusSnapshot,
    pub info: &'a DeviceInfo,
    pub storage_warning: bool,
    pub photos_taken: u64,
    pub width: u32,
    pub height: u32,
    pub now: std::time::Instant,
}
