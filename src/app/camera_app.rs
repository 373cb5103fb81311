use super::launcher::STATUS_BAR_HEIGHT;
use super::types::{UiTiming, ViewContext};
use crate::capture::{CaptureRequest, Photo};
use crate::display::{palette, Icon, Scene, TextSize, ICON_SIZE};
use crate::error::CaptureError;
use crate::frame::FrameData;
use crate::input::{Direction, InputEvent, InputKind};
use embedded_graphics::pixelcolor::Rgb565;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraOutcome {
    Ignored,
    Capture(CaptureRequest),
    OverlayToggled,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Saved,
    TryAgain,
    Fault(String),
}

impl Banner {
    fn text(&self) -> &str {
        match self {
            Banner::Saved => "Saved",
            Banner::TryAgain => "Try again",
            Banner::Fault(message) => message,
        }
    }

    fn color(&self) -> Rgb565 {
        match self {
            Banner::Saved => palette::OK,
            Banner::TryAgain => palette::WARNING,
            Banner::Fault(_) => palette::ERROR,
        }
    }
}

/// Viewfinder with shutter on CENTER
#[derive(Debug)]
pub struct CameraApp {
    timing: UiTiming,
    overlay_enabled: bool,
    overlay_until: Option<Instant>,
    capturing: bool,
    banner: Option<(Banner, Instant)>,
}

impl CameraApp {
    pub fn new(timing: UiTiming, overlay_enabled: bool) -> Self {
        Self {
            timing,
            overlay_enabled,
            overlay_until: None,
            capturing: false,
            banner: None,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn overlay_enabled(&self) -> bool {
        self.overlay_enabled
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref().map(|(banner, _)| banner)
    }

    pub fn overlay_visible(&self, now: Instant) -> bool {
        self.overlay_enabled && self.overlay_until.map_or(true, |until| now < until)
    }

    pub fn enter(&mut self, now: Instant) {
        self.banner = None;
        self.show_overlay(now);
    }

    pub fn leave(&mut self) {
        self.banner = None;
    }

    pub fn handle(&mut self, event: InputEvent, now: Instant) -> CameraOutcome {
        if event.kind == InputKind::Release {
            return CameraOutcome::Ignored;
        }
        self.show_overlay(now);

        match event.direction {
            Direction::Center => {
                // A second shutter while capturing is still sent; the pipeline answers busy
                self.capturing = true;
                CameraOutcome::Capture(CaptureRequest::now())
            }
            Direction::Up => CameraOutcome::Exit,
            Direction::Down => {
                self.overlay_enabled = !self.overlay_enabled;
                debug!("Camera overlay enabled: {}", self.overlay_enabled);
                CameraOutcome::OverlayToggled
            }
            Direction::Left | Direction::Right => CameraOutcome::Ignored,
        }
    }

    /// Apply a capture result. Returns false for a busy rejection, which
    /// leaves the capture in flight untouched.
    pub fn capture_resolved(
        &mut self,
        result: &Result<Photo, CaptureError>,
        now: Instant,
    ) -> bool {
        match result {
            Err(CaptureError::SensorBusy) => {
                self.set_banner(Banner::TryAgain, now);
                false
            }
            Ok(_) => {
                self.capturing = false;
                self.set_banner(Banner::Saved, now);
                true
            }
            Err(e) => {
                self.capturing = false;
                self.set_banner(Banner::Fault(e.user_message()), now);
                true
            }
        }
    }

    pub fn preview_failed(&mut self, error: &CaptureError, now: Instant) {
        self.set_banner(Banner::Fault(error.user_message()), now);
    }

    pub fn tick(&mut self, now: Instant) {
        if matches!(self.banner, Some((_, until)) if now >= until) {
            self.banner = None;
        }
    }

    pub fn render(&self, scene: &mut Scene, preview: Option<&FrameData>, view: &ViewContext<'_>) {
        let (width, height) = (view.width, view.height);
        match preview {
            Some(frame) => {
                scene.preview(frame.clone());
            }
            None => {
                scene.clear(palette::BLACK).centered_text(
                    width,
                    height as i32 / 2 + 14,
                    "No preview",
                    TextSize::Small,
                    palette::DIM_TEXT,
                );
            }
        }

        if self.overlay_visible(view.now) {
            scene
                .fill_rect(0, 0, width, STATUS_BAR_HEIGHT, palette::OVERLAY)
                .text(
                    2,
                    2,
                    view.status.clock.format("%H:%M").to_string(),
                    TextSize::Small,
                    palette::TEXT,
                );
            let count = format!("#{}", view.photos_taken);
            let count_x = width as i32 - ICON_SIZE as i32 - 4
                - count.len() as i32 * TextSize::Small.char_width() as i32;
            scene
                .text(count_x, 2, count, TextSize::Small, palette::TEXT)
                .icon(
                    width as i32 - ICON_SIZE as i32 - 1,
                    1,
                    Icon::Folder,
                    palette::CAMERA,
                );

            scene
                .fill_rect(0, height as i32 - 12, width, 12, palette::OVERLAY)
                .centered_text(
                    width,
                    height as i32 - 11,
                    "OK snap v ui ^ back",
                    TextSize::Small,
                    palette::DIM_TEXT,
                );
        }

        if view.storage_warning {
            scene.icon(2, STATUS_BAR_HEIGHT as i32 + 2, Icon::Warning, palette::WARNING);
        }

        let middle = height as i32 / 2;
        if self.capturing {
            scene
                .icon(
                    (width - ICON_SIZE) as i32 / 2,
                    middle - 16,
                    Icon::Hourglass,
                    palette::TEXT,
                )
                .centered_text(width, middle, "Capturing", TextSize::Small, palette::TEXT);
        }

        if let Some((banner, _)) = &self.banner {
            scene
                .fill_rect(0, middle + 12, width, 16, palette::OVERLAY)
                .centered_text(
                    width,
                    middle + 15,
                    banner.text(),
                    TextSize::Small,
                    banner.color(),
                );
        }
    }

    fn show_overlay(&mut self, now: Instant) {
        self.overlay_until = self.timing.overlay_timeout.map(|timeout| now + timeout);
    }

    fn set_banner(&mut self, banner: Banner, now: Instant) {
        let lifetime = match banner {
            Banner::Saved => self.timing.saved_banner,
            Banner::TryAgain => self.timing.busy_banner,
            Banner::Fault(_) => self.timing.error_banner,
        };
        self.banner = Some((banner, now + lifetime));
    }
}
