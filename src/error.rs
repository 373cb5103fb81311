use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("WiFi error: {0}")]
    Wifi(#[from] WifiError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl PicamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Startup-time structural problems the process cannot run without
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PicamError::Config(_) | PicamError::Storage(StorageError::MissingRoot { .. })
        )
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            PicamError::Config(_) | PicamError::Serialization(_) => false,
            PicamError::Input(e) => e.is_recoverable(),
            PicamError::Display(e) => e.is_recoverable(),
            PicamError::Capture(e) => e.is_recoverable(),
            PicamError::Storage(e) => e.is_recoverable(),
            _ => true,
        }
    }
}

/// Errors raised while reading the directional pad
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied for input device: {0}")]
    PermissionDenied(String),

    #[error("Failed to open input device {device}: {details}")]
    DeviceOpen { device: String, details: String },

    #[error("Input device read error: {details}")]
    DeviceRead { details: String },

    #[error("Input device {0} has no key capabilities")]
    UnsupportedDevice(String),

    #[error("Input backend not available on this system: {0}")]
    NotAvailable(String),
}

impl InputError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InputError::DeviceRead { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            InputError::DeviceNotFound(_) => "No button pad".to_string(),
            InputError::PermissionDenied(_) => "Pad: no access".to_string(),
            InputError::DeviceOpen { .. } => "Pad open failed".to_string(),
            InputError::DeviceRead { .. } => "Pad read error".to_string(),
            InputError::UnsupportedDevice(_) => "Pad unsupported".to_string(),
            InputError::NotAvailable(_) => "No input".to_string(),
        }
    }
}

/// Errors raised by the display panel
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to open framebuffer {device}: {source}")]
    FramebufferOpen {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Framebuffer write failed: {details}")]
    Framebuffer { details: String },

    #[error("Failed to open backlight {device}: {source}")]
    BacklightOpen {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Backlight control failed: {details}")]
    Backlight { details: String },

    #[error("Format conversion failed: {details}")]
    FormatConversion { details: String },
}

impl DisplayError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DisplayError::FramebufferOpen { .. })
    }
}

/// Per-capture failures. None of these are fatal to the running process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Sensor busy: a capture is already in flight")]
    SensorBusy,

    #[error("Sensor fault: {details}")]
    SensorFault { details: String },

    #[error("Storage full at {path}")]
    StorageFull { path: String },

    #[error("Failed to write {path}: {details}")]
    StorageWriteFailed { path: String, details: String },
}

impl CaptureError {
    pub fn sensor_fault<S: Into<String>>(details: S) -> Self {
        Self::SensorFault {
            details: details.into(),
        }
    }

    /// Every capture error leaves the process running; the user may press again
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Storage problems stay on screen until space is available again
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CaptureError::StorageFull { .. } | CaptureError::StorageWriteFailed { .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            CaptureError::SensorBusy => "Try again".to_string(),
            CaptureError::SensorFault { .. } => "Camera error".to_string(),
            CaptureError::StorageFull { .. } => "Storage full".to_string(),
            CaptureError::StorageWriteFailed { .. } => "Save failed".to_string(),
        }
    }
}

/// Errors around the photo tree and persisted state
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage root does not exist: {path}")]
    MissingRoot { path: String },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage root {path} is not writable: {source}")]
    NotWritable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to query free space on {path}: {details}")]
    FreeSpace { path: String, details: String },
}

impl StorageError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StorageError::FreeSpace { .. })
    }
}

#[derive(Error, Debug)]
pub enum WifiError {
    #[error("Command {command} failed: {details}")]
    Command { command: String, details: String },

    #[error("WiFi management disabled")]
    Disabled,
}

pub type Result<T> = std::result::Result<T, PicamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_config_error() {
        let err: PicamError = StorageError::MissingRoot {
            path: "/nope".to_string(),
        }
        .into();
        assert!(err.is_config_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_capture_errors_are_local() {
        for err in [
            CaptureError::SensorBusy,
            CaptureError::sensor_fault("timeout"),
            CaptureError::StorageFull {
                path: "/tmp".to_string(),
            },
        ] {
            assert!(err.is_recoverable());
            assert!(err.user_message().len() <= 20);
        }
        assert!(!CaptureError::SensorBusy.is_storage());
        assert!(CaptureError::StorageWriteFailed {
            path: "x".to_string(),
            details: "EIO".to_string()
        }
        .is_storage());
    }
}
