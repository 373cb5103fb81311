use super::types::{Direction, LineMask};
use crate::error::InputError;

/// Source of raw (undebounced) line levels
pub trait LineReader: Send {
    /// Snapshot the current level of all five lines
    fn read_lines(&mut self) -> Result<LineMask, InputError>;

    fn name(&self) -> &str;
}

#[cfg(all(feature = "input", target_os = "linux"))]
mod evdev_lines {
    use super::*;
    use evdev::{Device, EventType, Key};
    use tracing::info;

    const KEY_MAP: [(Key, Direction); 7] = [
        (Key::KEY_UP, Direction::Up),
        (Key::KEY_DOWN, Direction::Down),
        (Key::KEY_LEFT, Direction::Left),
        (Key::KEY_RIGHT, Direction::Right),
        (Key::KEY_ENTER, Direction::Center),
        (Key::KEY_SELECT, Direction::Center),
        (Key::KEY_OK, Direction::Center),
    ];

    pub(crate) fn direction_for_key(key: Key) -> Option<Direction> {
        KEY_MAP
            .iter()
            .find(|(mapped, _)| *mapped == key)
            .map(|(_, direction)| *direction)
    }

    /// gpio-keys device read through evdev key state
    pub struct EvdevLines {
        device: Device,
        path: String,
    }

    impl EvdevLines {
        pub fn open(path: &str) -> Result<Self, InputError> {
            let device = Device::open(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => InputError::DeviceNotFound(path.to_string()),
                std::io::ErrorKind::PermissionDenied => {
                    InputError::PermissionDenied(path.to_string())
                }
                _ => InputError::DeviceOpen {
                    device: path.to_string(),
                    details: e.to_string(),
                },
            })?;

            if !device.supported_events().contains(EventType::KEY) {
                return Err(InputError::UnsupportedDevice(path.to_string()));
            }

            info!(
                "Opened button device {} ({})",
                path,
                device.name().unwrap_or("unnamed")
            );

            Ok(Self {
                device,
                path: path.to_string(),
            })
        }
    }

    impl LineReader for EvdevLines {
        fn read_lines(&mut self) -> Result<LineMask, InputError> {
            let keys = self
                .device
                .get_key_state()
                .map_err(|e| InputError::DeviceRead {
                    details: e.to_string(),
                })?;

            Ok(keys
                .iter()
                .filter_map(direction_for_key)
                .collect())
        }

        fn name(&self) -> &str {
            &self.path
        }
    }
}

#[cfg(all(feature = "input", target_os = "linux"))]
pub use evdev_lines::EvdevLines;

#[cfg(all(test, feature = "input", target_os = "linux"))]
mod tests {
    use super::evdev_lines::direction_for_key;
    use super::*;
    use evdev::Key;

    #[test]
    fn test_gpio_keys_map_to_lines() {
        assert_eq!(direction_for_key(Key::KEY_UP), Some(Direction::Up));
        assert_eq!(direction_for_key(Key::KEY_ENTER), Some(Direction::Center));
        assert_eq!(direction_for_key(Key::KEY_OK), Some(Direction::Center));
        assert_eq!(direction_for_key(Key::BTN_TOUCH), None);
    }
}
