#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst_sensor;
mod mock;
mod sensor;

#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst_sensor::GstreamerSensor;
pub use mock::{MockSensor, MockSensorControl};
pub use sensor::CameraSensor;

use crate::config::{CameraBackend, CameraConfig};
use crate::error::CaptureError;

/// Build the configured sensor; preview frames come out at `preview_size`
pub fn open_sensor(
    config: &CameraConfig,
    preview_size: (u32, u32),
) -> Result<Box<dyn CameraSensor>, CaptureError> {
    match config.backend {
        CameraBackend::Mock => Ok(Box::new(MockSensor::new(
            preview_size,
            config.still_resolution,
        ))),
        CameraBackend::Gstreamer => open_gstreamer(config, preview_size),
    }
}

#[cfg(all(feature = "camera", target_os = "linux"))]
fn open_gstreamer(
    config: &CameraConfig,
    preview_size: (u32, u32),
) -> Result<Box<dyn CameraSensor>, CaptureError> {
    Ok(Box::new(GstreamerSensor::new(config, preview_size)?))
}

#[cfg(not(all(feature = "camera", target_os = "linux")))]
fn open_gstreamer(
    _config: &CameraConfig,
    _preview_size: (u32, u32),
) -> Result<Box<dyn CameraSensor>, CaptureError> {
    Err(CaptureError::sensor_fault(
        "GStreamer camera support not compiled in (enable the `camera` feature)",
    ))
}
