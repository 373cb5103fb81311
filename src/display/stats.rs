use std::time::{Duration, SystemTime};

/// Renderer frame accounting
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    pub frames_presented: u64,
    pub frames_dropped: u64,
    pub blit_errors: u64,
    pub worst_compose: Duration,
    pub total_compose: Duration,
    pub last_frame_time: Option<SystemTime>,
}

impl RenderStats {
    pub fn record_compose(&mut self, elapsed: Duration) {
        self.total_compose += elapsed;
        if elapsed > self.worst_compose {
            self.worst_compose = elapsed;
        }
    }

    pub fn record_frame(&mut self) {
        self.frames_presented += 1;
        self.last_frame_time = Some(SystemTime::now());
    }

    pub fn record_drop(&mut self) {
        self.frames_dropped += 1;
    }

    pub fn record_blit_error(&mut self) {
        self.blit_errors += 1;
    }

    /// Frames that reached the panel over all frames attempted
    pub fn present_rate(&self) -> f64 {
        let attempted = self.frames_presented + self.frames_dropped + self.blit_errors;
        if attempted == 0 {
            0.0
        } else {
            self.frames_presented as f64 / attempted as f64
        }
    }

    pub fn average_compose(&self) -> Duration {
        let composed = self.frames_presented + self.frames_dropped + self.blit_errors;
        if composed == 0 {
            Duration::ZERO
        } else {
            self.total_compose / composed as u32
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
