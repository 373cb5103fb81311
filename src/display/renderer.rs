use super::framebuffer::FrameBuffer;
use super::panel::DisplayPanel;
use super::scene::Scene;
use super::stats::RenderStats;
use crate::error::DisplayError;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What happened to a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The frame reached the panel
    Presented,
    /// Composition ran past the frame interval; the panel keeps the previous frame
    Dropped,
}

/// Composes scenes into one reusable buffer and pushes complete frames to the panel
pub struct FrameRenderer {
    buffer: FrameBuffer,
    panel: Box<dyn DisplayPanel>,
    frame_interval: Duration,
    backlight_on: Option<bool>,
    stats: RenderStats,
}

impl FrameRenderer {
    pub fn new(
        panel: Box<dyn DisplayPanel>,
        width: u32,
        height: u32,
        frame_interval: Duration,
    ) -> Self {
        info!(
            "Frame renderer {}x{} on {} ({:?} per frame)",
            width,
            height,
            panel.name(),
            frame_interval
        );
        Self {
            buffer: FrameBuffer::new(width, height),
            panel,
            frame_interval,
            backlight_on: None,
            stats: RenderStats::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Compose `scene` and push it. The panel never sees a half-drawn buffer.
    pub fn render(&mut self, scene: &Scene) -> Result<RenderOutcome, DisplayError> {
        let started = Instant::now();
        scene.compose(&mut self.buffer);
        let compose_time = started.elapsed();
        self.stats.record_compose(compose_time);

        if compose_time >= self.frame_interval {
            self.stats.record_drop();
            debug!(
                "Dropping frame: compose took {:?} (budget {:?})",
                compose_time, self.frame_interval
            );
            return Ok(RenderOutcome::Dropped);
        }

        match self.panel.blit(&self.buffer) {
            Ok(()) => {
                self.stats.record_frame();
                Ok(RenderOutcome::Presented)
            }
            Err(e) => {
                self.stats.record_blit_error();
                warn!("Display blit failed: {}", e);
                Err(e)
            }
        }
    }

    /// Switch the backlight, skipping writes when nothing changes
    pub fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        if self.backlight_on == Some(on) {
            return Ok(());
        }
        self.panel.set_backlight(on)?;
        self.backlight_on = Some(on);
        Ok(())
    }

    pub fn backlight_on(&self) -> bool {
        self.backlight_on.unwrap_or(true)
    }
}
