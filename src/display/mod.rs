mod converter;
mod framebuffer;
mod icons;
mod panel;
mod renderer;
mod scene;
mod stats;
#[cfg(test)]
mod tests;

pub use converter::DisplayConverter;
pub use framebuffer::FrameBuffer;
pub use icons::{Icon, ICON_SIZE};
pub use panel::{DisplayPanel, FramebufferPanel, MemoryPanel};
pub use renderer::{FrameRenderer, RenderOutcome};
pub use scene::{palette, DrawCommand, Scene, TextSize};
pub use stats::RenderStats;

use crate::config::DisplayConfig;
use crate::error::DisplayError;

/// Build the renderer for the configured framebuffer, or an in-memory panel
pub fn open_renderer(config: &DisplayConfig, headless: bool) -> Result<FrameRenderer, DisplayError> {
    let panel: Box<dyn DisplayPanel> = if headless {
        Box::new(MemoryPanel::new())
    } else {
        Box::new(FramebufferPanel::open(config)?)
    };

    Ok(FrameRenderer::new(
        panel,
        config.width,
        config.height,
        config.frame_interval(),
    ))
}
