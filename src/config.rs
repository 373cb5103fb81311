use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PicamConfig {
    pub input: InputConfig,
    pub display: DisplayConfig,
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    pub wifi: WifiConfig,
}

/// Where raw button lines come from
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InputBackend {
    /// gpio-keys input device read through evdev
    Evdev,
    /// Terminal arrow keys, for desktop development
    Keyboard,
    /// No buttons at all (dry runs, kiosk testing)
    ScriptedIdle,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InputConfig {
    /// Input event device exposing the five buttons
    #[serde(default = "default_input_device")]
    pub device: String,

    #[serde(default = "default_input_backend")]
    pub backend: InputBackend,

    /// How often the raw lines are sampled
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// A line must be stable this long before it counts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Hold time that turns a press into a long press
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,

    /// Hold time after which a line is reported as stuck
    #[serde(default = "default_stuck_line_ms")]
    pub stuck_line_ms: u64,

    /// How long a terminal key press keeps its line asserted
    #[serde(default = "default_keyboard_hold_ms")]
    pub keyboard_hold_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    /// Framebuffer device path
    #[serde(default = "default_framebuffer_device")]
    pub device: String,

    /// Backlight control device path
    pub backlight_device: Option<String>,

    #[serde(default = "default_display_width")]
    pub width: u32,

    #[serde(default = "default_display_height")]
    pub height: u32,

    /// Preview/redraw rate
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Panel rotation applied when pushing frames
    pub rotation: Option<Rotation>,

    /// Launcher idle time before the sleep screen, 0 disables
    #[serde(default = "default_sleep_after_seconds")]
    pub sleep_after_seconds: u64,

    /// Camera overlay auto-hide delay
    #[serde(default = "default_ui_timeout_seconds")]
    pub ui_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CameraBackend {
    Mock,
    Gstreamer,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_camera_backend")]
    pub backend: CameraBackend,

    /// V4L2 device used by the GStreamer backend
    #[serde(default = "default_camera_device")]
    pub device: String,

    /// Full-resolution still size (width, height)
    #[serde(default = "default_still_resolution")]
    pub still_resolution: (u32, u32),

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Settle time after switching the sensor into still mode
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Root of the shared photo tree; must exist
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Directory for persisted launcher state
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// IANA timezone for date folders, local time when unset
    pub timezone: Option<String>,

    /// Captures are refused below this much free space
    #[serde(default = "default_min_free_bytes")]
    pub min_free_bytes: u64,

    /// Write README.txt describing the layout into the root
    #[serde(default = "default_write_readme")]
    pub write_readme: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WifiConfig {
    #[serde(default = "default_wifi_interface")]
    pub interface: String,

    #[serde(default = "default_wifi_poll_interval")]
    pub poll_interval_seconds: u64,

    #[serde(default = "default_wifi_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Rotate90,
    Rotate180,
    Rotate270,
}

impl InputConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn stuck_line(&self) -> Duration {
        Duration::from_millis(self.stuck_line_ms)
    }
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.target_fps.max(1) as u64)
    }
}

impl StorageConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(&self.state_dir)
    }
}

impl PicamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("picam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("input.device", default_input_device())?
            .set_default("input.backend", "evdev")?
            .set_default("input.sample_interval_ms", default_sample_interval_ms())?
            .set_default("input.debounce_ms", default_debounce_ms())?
            .set_default("input.long_press_ms", default_long_press_ms())?
            .set_default("input.stuck_line_ms", default_stuck_line_ms())?
            .set_default("input.keyboard_hold_ms", default_keyboard_hold_ms())?
            .set_default("display.device", default_framebuffer_device())?
            .set_default("display.width", default_display_width())?
            .set_default("display.height", default_display_height())?
            .set_default("display.target_fps", default_target_fps())?
            .set_default("display.sleep_after_seconds", default_sleep_after_seconds())?
            .set_default("display.ui_timeout_seconds", default_ui_timeout_seconds())?
            .set_default("camera.backend", "gstreamer")?
            .set_default("camera.device", default_camera_device())?
            .set_default(
                "camera.still_resolution",
                vec![default_still_resolution().0, default_still_resolution().1],
            )?
            .set_default("camera.jpeg_quality", default_jpeg_quality() as u64)?
            .set_default("camera.warmup_ms", default_warmup_ms())?
            .set_default("storage.root", default_storage_root())?
            .set_default("storage.state_dir", default_state_dir())?
            .set_default("storage.extension", default_extension())?
            .set_default("storage.filename_prefix", default_filename_prefix())?
            .set_default("storage.min_free_bytes", default_min_free_bytes())?
            .set_default("storage.write_readme", default_write_readme())?
            .set_default("wifi.interface", default_wifi_interface())?
            .set_default("wifi.poll_interval_seconds", default_wifi_poll_interval())?
            .set_default("wifi.enabled", default_wifi_enabled())?
            .add_source(File::with_name(&path_str).required(false))
            // PICAM__INPUT__DEBOUNCE_MS=25 style overrides
            .add_source(Environment::with_prefix("PICAM").separator("__"))
            .build()?;

        let config: PicamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let input = &self.input;
        if input.sample_interval_ms == 0 || input.debounce_ms == 0 {
            return Err(ConfigError::Message(
                "Input sample interval and debounce window must be greater than 0".to_string(),
            ));
        }

        if input.long_press_ms <= input.debounce_ms {
            return Err(ConfigError::Message(
                "Input long_press_ms must be greater than debounce_ms".to_string(),
            ));
        }

        if input.stuck_line_ms <= input.long_press_ms {
            return Err(ConfigError::Message(
                "Input stuck_line_ms must be greater than long_press_ms".to_string(),
            ));
        }

        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Message(
                "Display resolution must be greater than 0".to_string(),
            ));
        }

        if self.display.target_fps == 0 {
            return Err(ConfigError::Message(
                "Display target_fps must be greater than 0".to_string(),
            ));
        }

        if self.display.frame_interval() < input.sample_interval() {
            return Err(ConfigError::Message(
                "Display frame interval must not be shorter than the input sample interval"
                    .to_string(),
            ));
        }

        if self.camera.still_resolution.0 == 0 || self.camera.still_resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera still_resolution must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(ConfigError::Message(
                "Camera jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage root must not be empty".to_string(),
            ));
        }

        if self.storage.extension.is_empty() || self.storage.extension.contains('/') {
            return Err(ConfigError::Message(format!(
                "Invalid photo extension '{}'",
                self.storage.extension
            )));
        }

        if let Some(tz) = &self.storage.timezone {
            if tz.parse::<chrono_tz::Tz>().is_err() {
                return Err(ConfigError::Message(format!("Unknown timezone '{}'", tz)));
            }
        }

        if self.wifi.enabled && self.wifi.poll_interval_seconds == 0 {
            return Err(ConfigError::Message(
                "WiFi poll_interval_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Default configuration rendered as TOML
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}

impl Default for PicamConfig {
    fn default() -> Self {
        Self {
            input: InputConfig {
                device: default_input_device(),
                backend: default_input_backend(),
                sample_interval_ms: default_sample_interval_ms(),
                debounce_ms: default_debounce_ms(),
                long_press_ms: default_long_press_ms(),
                stuck_line_ms: default_stuck_line_ms(),
                keyboard_hold_ms: default_keyboard_hold_ms(),
            },
            display: DisplayConfig {
                device: default_framebuffer_device(),
                backlight_device: None,
                width: default_display_width(),
                height: default_display_height(),
                target_fps: default_target_fps(),
                rotation: None,
                sleep_after_seconds: default_sleep_after_seconds(),
                ui_timeout_seconds: default_ui_timeout_seconds(),
            },
            camera: CameraConfig {
                backend: default_camera_backend(),
                device: default_camera_device(),
                still_resolution: default_still_resolution(),
                jpeg_quality: default_jpeg_quality(),
                warmup_ms: default_warmup_ms(),
            },
            storage: StorageConfig {
                root: default_storage_root(),
                state_dir: default_state_dir(),
                extension: default_extension(),
                filename_prefix: default_filename_prefix(),
                timezone: None,
                min_free_bytes: default_min_free_bytes(),
                write_readme: default_write_readme(),
            },
            wifi: WifiConfig {
                interface: default_wifi_interface(),
                poll_interval_seconds: default_wifi_poll_interval(),
                enabled: default_wifi_enabled(),
            },
        }
    }
}

// Default value functions
fn default_input_device() -> String {
    "/dev/input/by-path/platform-gpio-keys-event".to_string()
}
fn default_input_backend() -> InputBackend {
    InputBackend::Evdev
}
fn default_sample_interval_ms() -> u64 {
    10
}
fn default_debounce_ms() -> u64 {
    20
}
fn default_long_press_ms() -> u64 {
    600
}
fn default_stuck_line_ms() -> u64 {
    5000
}
fn default_keyboard_hold_ms() -> u64 {
    120
}

fn default_framebuffer_device() -> String {
    "/dev/fb1".to_string()
}
fn default_display_width() -> u32 {
    128
}
fn default_display_height() -> u32 {
    128
}
fn default_target_fps() -> u32 {
    15
}
fn default_sleep_after_seconds() -> u64 {
    300
}
fn default_ui_timeout_seconds() -> u64 {
    5
}

fn default_camera_backend() -> CameraBackend {
    CameraBackend::Gstreamer
}
fn default_camera_device() -> String {
    "/dev/video0".to_string()
}
fn default_still_resolution() -> (u32, u32) {
    (1640, 1232)
}
fn default_jpeg_quality() -> u8 {
    85
}
fn default_warmup_ms() -> u64 {
    0
}

fn default_storage_root() -> String {
    "/home/pi/camera_share".to_string()
}
fn default_state_dir() -> String {
    "/home/pi/camera/data".to_string()
}
fn default_extension() -> String {
    "jpg".to_string()
}
fn default_filename_prefix() -> String {
    "photo".to_string()
}
fn default_min_free_bytes() -> u64 {
    8 * 1024 * 1024
}
fn default_write_readme() -> bool {
    true
}

fn default_wifi_interface() -> String {
    "wlan0".to_string()
}
fn default_wifi_poll_interval() -> u64 {
    10
}
fn default_wifi_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PicamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.display.frame_interval(), Duration::from_millis(66));
        assert_eq!(config.input.debounce(), Duration::from_millis(20));
    }

    #[test]
    fn test_config_validation() {
        let mut config = PicamConfig::default();

        config.input.long_press_ms = 10;
        assert!(config.validate().is_err());

        config.input.long_press_ms = 600;
        config.camera.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.camera.jpeg_quality = 90;
        config.storage.timezone = Some("Mars/Olympus".to_string());
        assert!(config.validate().is_err());

        config.storage.timezone = Some("Europe/Berlin".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_with_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[input]\ndebounce_ms = 25\nbackend = \"keyboard\"\n\n[storage]\nroot = \"/srv/photos\"\n"
        )
        .unwrap();

        let config = PicamConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.debounce_ms, 25);
        assert_eq!(config.input.backend, InputBackend::Keyboard);
        assert_eq!(config.input.long_press_ms, 600);
        assert_eq!(config.storage.root, "/srv/photos");
        assert_eq!(config.camera.still_resolution, (1640, 1232));
        assert_eq!(config.camera.backend, CameraBackend::Gstreamer);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let rendered = PicamConfig::default_toml().unwrap();
        let parsed: PicamConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.display.width, 128);
        assert_eq!(parsed.camera.backend, CameraBackend::Gstreamer);
    }
}
