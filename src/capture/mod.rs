mod encode;
mod pipeline;
mod types;
#[cfg(test)]
mod tests;

pub use pipeline::{CapturePipeline, CaptureTicket, PreviewStream};
pub use types::{CaptureRequest, CaptureStats, Photo};
