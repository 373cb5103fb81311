use super::sensor::CameraSensor;
use crate::config::CameraConfig;
use crate::error::CaptureError;
use crate::frame::FrameData;
use gstreamer::prelude::*;
use gstreamer::{ClockTime, Pipeline};
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

const STILL_TIMEOUT: Duration = Duration::from_secs(5);

/// V4L2 camera read through GStreamer appsink pipelines
pub struct GstreamerSensor {
    device: String,
    preview_size: (u32, u32),
    still_size: (u32, u32),
    warmup: Duration,
    preview: Option<(Pipeline, AppSink)>,
    frame_counter: u64,
}

impl GstreamerSensor {
    pub fn new(config: &CameraConfig, preview_size: (u32, u32)) -> Result<Self, CaptureError> {
        gstreamer::init().map_err(|e| {
            CaptureError::sensor_fault(format!("Failed to initialize GStreamer: {}", e))
        })?;

        info!(
            "Initializing GStreamer camera {} (preview {}x{}, still {}x{})",
            config.device,
            preview_size.0,
            preview_size.1,
            config.still_resolution.0,
            config.still_resolution.1
        );

        Ok(Self {
            device: config.device.clone(),
            preview_size,
            still_size: config.still_resolution,
            warmup: Duration::from_millis(config.warmup_ms),
            preview: None,
            frame_counter: 0,
        })
    }

    fn pipeline_string(&self, (width, height): (u32, u32), max_buffers: u32) -> String {
        format!(
            "v4l2src device={} ! videoconvert ! videoscale ! \
             video/x-raw,format=RGB,width={},height={} ! \
             appsink name=sink sync=false max-buffers={} drop=true emit-signals=false",
            self.device, width, height, max_buffers
        )
    }

    fn launch(&self, size: (u32, u32), max_buffers: u32) -> Result<(Pipeline, AppSink), CaptureError> {
        let description = self.pipeline_string(size, max_buffers);
        debug!("Creating GStreamer pipeline: {}", description);

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CaptureError::sensor_fault(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| CaptureError::sensor_fault("Failed to downcast to Pipeline"))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CaptureError::sensor_fault("Failed to get appsink element"))?
            .downcast::<AppSink>()
            .map_err(|_| CaptureError::sensor_fault("Failed to downcast to AppSink"))?;

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CaptureError::sensor_fault(format!("Failed to start pipeline: {}", e)))?;

        Ok((pipeline, appsink))
    }

    fn sample_to_frame(&mut self, sample: gstreamer::Sample) -> Result<FrameData, CaptureError> {
        let buffer = sample
            .buffer()
            .ok_or_else(|| CaptureError::sensor_fault("No buffer in sample"))?;
        let caps = sample
            .caps()
            .ok_or_else(|| CaptureError::sensor_fault("No caps in sample"))?;
        let video_info = VideoInfo::from_caps(caps)
            .map_err(|e| CaptureError::sensor_fault(format!("Failed to get video info: {}", e)))?;

        let width = video_info.width();
        let height = video_info.height();
        let stride = video_info.stride()[0] as usize;
        let row_bytes = width as usize * 3;

        let map = buffer
            .map_readable()
            .map_err(|e| CaptureError::sensor_fault(format!("Failed to map buffer: {}", e)))?;
        let bytes = map.as_slice();

        // Rows may be padded to the stride
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let line = bytes
                .get(start..start + row_bytes)
                .ok_or_else(|| CaptureError::sensor_fault("Short frame buffer"))?;
            data.extend_from_slice(line);
        }

        let id = self.frame_counter;
        self.frame_counter += 1;
        Ok(FrameData::new(id, SystemTime::now(), data, width, height))
    }
}

impl CameraSensor for GstreamerSensor {
    fn start_preview(&mut self) -> Result<(), CaptureError> {
        if self.preview.is_some() {
            return Ok(());
        }
        self.preview = Some(self.launch(self.preview_size, 2)?);
        info!("GStreamer preview started");
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CaptureError> {
        if let Some((pipeline, _)) = self.preview.take() {
            pipeline
                .set_state(gstreamer::State::Null)
                .map_err(|e| CaptureError::sensor_fault(format!("Failed to stop preview: {}", e)))?;
            info!("GStreamer preview stopped");
        }
        Ok(())
    }

    fn preview_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        let sample = match &self.preview {
            Some((_, appsink)) => appsink.try_pull_sample(ClockTime::ZERO),
            None => return Ok(None),
        };
        sample.map(|s| self.sample_to_frame(s)).transpose()
    }

    fn capture_still(&mut self) -> Result<FrameData, CaptureError> {
        let (pipeline, appsink) = self.launch(self.still_size, 1)?;
        let started = Instant::now();

        let result = loop {
            let remaining = STILL_TIMEOUT.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break Err(CaptureError::sensor_fault("Timed out waiting for still frame"));
            }
            match appsink.try_pull_sample(ClockTime::from_mseconds(remaining.as_millis() as u64)) {
                // Let auto-exposure settle before keeping a frame
                Some(_) if started.elapsed() < self.warmup => continue,
                Some(sample) => break self.sample_to_frame(sample),
                None => break Err(CaptureError::sensor_fault("Camera produced no still frame")),
            }
        };

        if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to stop still pipeline: {}", e);
        }
        result
    }

    fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    fn name(&self) -> &str {
        &self.device
    }
}

impl Drop for GstreamerSensor {
    fn drop(&mut self) {
        let _ = self.stop_preview();
    }
}
