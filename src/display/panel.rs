use super::converter::DisplayConverter;
use super::framebuffer::FrameBuffer;
use crate::config::{DisplayConfig, Rotation};
use crate::error::DisplayError;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Physical (or fake) display the renderer pushes finished frames to
pub trait DisplayPanel: Send {
    /// Push a fully composed frame to the panel
    fn blit(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError>;

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError>;

    fn name(&self) -> &str;
}

/// Linux framebuffer device (fbtft) taking little-endian RGB565
pub struct FramebufferPanel {
    device_path: String,
    framebuffer: File,
    backlight_path: Option<String>,
    backlight: Option<File>,
    rotation: Option<Rotation>,
    scratch: Vec<u8>,
}

impl FramebufferPanel {
    pub fn open(config: &DisplayConfig) -> Result<Self, DisplayError> {
        let framebuffer = OpenOptions::new()
            .write(true)
            .open(&config.device)
            .map_err(|e| DisplayError::FramebufferOpen {
                device: config.device.clone(),
                source: e,
            })?;
        info!("Framebuffer opened: {}", config.device);

        let backlight = match &config.backlight_device {
            Some(path) => match Self::open_backlight(path) {
                Ok(file) => {
                    info!("Backlight device opened: {}", path);
                    Some(file)
                }
                Err(e) => {
                    warn!("Failed to open backlight device {}: {}", path, e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            device_path: config.device.clone(),
            framebuffer,
            backlight_path: config.backlight_device.clone(),
            backlight,
            rotation: config.rotation,
            scratch: Vec::with_capacity((config.width * config.height * 2) as usize),
        })
    }

    fn open_backlight(path: &str) -> Result<File, DisplayError> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| DisplayError::BacklightOpen {
                device: path.to_string(),
                source: e,
            })
    }
}

impl DisplayPanel for FramebufferPanel {
    fn blit(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let words = frame.raw();
        let words = match self.rotation {
            Some(rotation) => {
                DisplayConverter::rotate_rgb565(&words, frame.width(), frame.height(), rotation)?.0
            }
            None => words,
        };
        DisplayConverter::to_le_bytes(&words, &mut self.scratch);

        self.framebuffer
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.framebuffer.write_all(&self.scratch))
            .and_then(|_| self.framebuffer.flush())
            .map_err(|e| DisplayError::Framebuffer {
                details: format!("{}: {}", self.device_path, e),
            })
    }

    /// Writes sysfs `bl_power` style values: "0" on, "1" off
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        if self.backlight.is_none() {
            if let Some(path) = &self.backlight_path {
                self.backlight = Some(Self::open_backlight(path)?);
                debug!("Backlight device reconnected");
            }
        }

        let Some(bl_file) = self.backlight.as_mut() else {
            return Ok(());
        };

        let power_value = if on { "0" } else { "1" };
        bl_file
            .seek(SeekFrom::Start(0))
            .and_then(|_| bl_file.write_all(power_value.as_bytes()))
            .and_then(|_| bl_file.flush())
            .map_err(|e| DisplayError::Backlight {
                details: format!("Failed to write backlight: {}", e),
            })?;

        debug!(
            "Backlight set to: {} (power value: {})",
            if on { "ON" } else { "OFF" },
            power_value
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.device_path
    }
}

#[derive(Debug, Default)]
struct MemoryPanelState {
    last_frame: Option<FrameBuffer>,
    blit_count: u64,
    backlight_on: bool,
    fail_next_blit: bool,
}

/// In-memory panel for tests, dry runs and headless desktops.
///
/// Clones share the same state, so a test can keep one handle while the
/// renderer owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryPanel {
    state: Arc<Mutex<MemoryPanelState>>,
}

impl MemoryPanel {
    pub fn new() -> Self {
        let panel = Self::default();
        panel.state.lock().backlight_on = true;
        panel
    }

    pub fn last_frame(&self) -> Option<FrameBuffer> {
        self.state.lock().last_frame.clone()
    }

    pub fn blit_count(&self) -> u64 {
        self.state.lock().blit_count
    }

    pub fn backlight_on(&self) -> bool {
        self.state.lock().backlight_on
    }

    pub fn fail_next_blit(&self) {
        self.state.lock().fail_next_blit = true;
    }
}

impl DisplayPanel for MemoryPanel {
    fn blit(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next_blit) {
            return Err(DisplayError::Framebuffer {
                details: "simulated blit failure".to_string(),
            });
        }
        state.last_frame = Some(frame.clone());
        state.blit_count += 1;
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        self.state.lock().backlight_on = on;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
