use crate::error::CaptureError;
use crate::frame::FrameData;

/// Camera sensor capability handed to the capture pipeline.
///
/// Implementations are driven from one thread at a time; the pipeline
/// serialises access.
pub trait CameraSensor: Send {
    /// Start streaming downsampled preview frames
    fn start_preview(&mut self) -> Result<(), CaptureError>;

    fn stop_preview(&mut self) -> Result<(), CaptureError>;

    /// Newest preview frame since the last call, `None` when nothing new arrived
    fn preview_frame(&mut self) -> Result<Option<FrameData>, CaptureError>;

    /// Switch to still mode if needed and capture one full-resolution frame
    fn capture_still(&mut self) -> Result<FrameData, CaptureError>;

    fn is_previewing(&self) -> bool;

    fn name(&self) -> &str;
}
