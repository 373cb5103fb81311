use super::sensor::CameraSensor;
use crate::error::CaptureError;
use crate::frame::FrameData;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct MockSensorState {
    previewing: bool,
    preview_starts: u64,
    stills_captured: u64,
    still_failures: VecDeque<String>,
    preview_failures: VecDeque<String>,
    still_timestamp: Option<SystemTime>,
}

/// Handle for steering and inspecting a [`MockSensor`] after it has been handed off
#[derive(Debug, Clone, Default)]
pub struct MockSensorControl {
    state: Arc<Mutex<MockSensorState>>,
}

impl MockSensorControl {
    /// Make the next still capture fail with a sensor fault
    pub fn fail_next_capture<S: Into<String>>(&self, details: S) {
        self.state.lock().still_failures.push_back(details.into());
    }

    pub fn fail_next_preview<S: Into<String>>(&self, details: S) {
        self.state.lock().preview_failures.push_back(details.into());
    }

    /// Stamp every following still with this time instead of the wall clock
    pub fn set_still_timestamp(&self, timestamp: SystemTime) {
        self.state.lock().still_timestamp = Some(timestamp);
    }

    pub fn is_previewing(&self) -> bool {
        self.state.lock().previewing
    }

    pub fn preview_starts(&self) -> u64 {
        self.state.lock().preview_starts
    }

    pub fn stills_captured(&self) -> u64 {
        self.state.lock().stills_captured
    }
}

/// Synthetic sensor producing a moving test pattern
pub struct MockSensor {
    preview_size: (u32, u32),
    still_size: (u32, u32),
    still_latency: Duration,
    frame_counter: u64,
    control: MockSensorControl,
}

impl MockSensor {
    pub fn new(preview_size: (u32, u32), still_size: (u32, u32)) -> Self {
        Self {
            preview_size,
            still_size,
            still_latency: Duration::ZERO,
            frame_counter: 0,
            control: MockSensorControl::default(),
        }
    }

    /// Sleep this long inside every still capture
    pub fn with_still_latency(mut self, latency: Duration) -> Self {
        self.still_latency = latency;
        self
    }

    pub fn control(&self) -> MockSensorControl {
        self.control.clone()
    }

    fn pattern(&mut self, (width, height): (u32, u32), timestamp: SystemTime) -> FrameData {
        let id = self.frame_counter;
        self.frame_counter += 1;

        let shift = (id % 256) as u32 * 4;
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.push(((x + shift) * 255 / width.max(1)) as u8);
                data.push((y * 255 / height.max(1)) as u8);
                data.push((((x + y + shift) % 64) * 4) as u8);
            }
        }

        FrameData::new(id, timestamp, data, width, height)
    }
}

impl CameraSensor for MockSensor {
    fn start_preview(&mut self) -> Result<(), CaptureError> {
        let mut state = self.control.state.lock();
        if !state.previewing {
            state.previewing = true;
            state.preview_starts += 1;
            debug!("Mock sensor preview started");
        }
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CaptureError> {
        let mut state = self.control.state.lock();
        if state.previewing {
            state.previewing = false;
            debug!("Mock sensor preview stopped");
        }
        Ok(())
    }

    fn preview_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        {
            let mut state = self.control.state.lock();
            if let Some(details) = state.preview_failures.pop_front() {
                return Err(CaptureError::SensorFault { details });
            }
            if !state.previewing {
                return Ok(None);
            }
        }

        let frame = self.pattern(self.preview_size, SystemTime::now());
        trace!("Mock preview frame {}", frame.id);
        Ok(Some(frame))
    }

    fn capture_still(&mut self) -> Result<FrameData, CaptureError> {
        if !self.still_latency.is_zero() {
            std::thread::sleep(self.still_latency);
        }

        let timestamp = {
            let mut state = self.control.state.lock();
            if let Some(details) = state.still_failures.pop_front() {
                return Err(CaptureError::SensorFault { details });
            }
            state.stills_captured += 1;
            state.still_timestamp.unwrap_or_else(SystemTime::now)
        };

        Ok(self.pattern(self.still_size, timestamp))
    }

    fn is_previewing(&self) -> bool {
        self.control.is_previewing()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
