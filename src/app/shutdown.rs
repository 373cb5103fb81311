use super::runtime::PicamRuntime;
use super::types::ShutdownReason;
use crate::display::{palette, Scene, TextSize};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info, warn};

const CAPTURE_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

impl PicamRuntime {
    /// Let a running capture land, save state, blank the panel
    pub async fn shutdown(&mut self, reason: ShutdownReason) -> i32 {
        info!("Beginning graceful shutdown");

        if let Some(ticket) = self.in_flight.take() {
            info!("Waiting for the capture in flight");
            match timeout(CAPTURE_DRAIN_TIMEOUT, ticket.wait()).await {
                Ok(result) => {
                    if let Err(e) = &result {
                        warn!("Capture in flight at shutdown failed: {}", e);
                    }
                    // Only the photo count matters now; held input is dropped
                    let _ = self.machine.capture_resolved(result, Instant::now());
                }
                Err(_) => error!("Capture still running after {:?}", CAPTURE_DRAIN_TIMEOUT),
            }
        }

        self.preview = None;
        self.latest_preview = None;
        if !self.pipeline.is_busy() {
            self.pipeline.shutdown();
        }

        self.persist_state();

        let mut scene = Scene::new();
        scene.clear(palette::BLACK).centered_text(
            self.renderer.width(),
            self.renderer.height() as i32 / 2 - 5,
            "Shutting down",
            TextSize::Small,
            palette::DIM_TEXT,
        );
        if let Err(e) = self.renderer.render(&scene) {
            warn!("Failed to draw shutdown screen: {}", e);
        }

        self.cancellation_token.cancel();

        if let Err(e) = self.renderer.set_backlight(false) {
            warn!("Failed to turn backlight off: {}", e);
        }

        let exit_code = match reason {
            ShutdownReason::Error(_) => 1,
            ShutdownReason::Signal(_) | ShutdownReason::UserRequest(_) => 0,
        };
        info!("Graceful shutdown completed with exit code: {}", exit_code);
        exit_code
    }
}
