use crate::app::AppScreen;
use crate::input::InputEvent;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events that can occur in the camera system
#[derive(Debug, Clone)]
pub enum PicamEvent {
    /// A debounced button event was routed to the active app
    InputReceived { event: InputEvent },
    /// The active screen changed
    ScreenChanged { from: AppScreen, to: AppScreen },
    /// A still capture was handed to the pipeline
    CaptureStarted { requested_at: std::time::SystemTime },
    /// A photo reached its final location
    CaptureCompleted { path: PathBuf },
    /// A capture resolved with an error
    CaptureFailed { error: String },
    /// A hardware component misbehaved but the system keeps running
    HardwareFault { component: String, details: String },
    /// Persistent storage warning toggled
    StorageWarning { active: bool },
    /// Shutdown requested from inside the application
    ShutdownRequested { reason: String },
}

impl PicamEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            PicamEvent::InputReceived { event } => {
                format!("Input {:?} {:?}", event.direction, event.kind)
            }
            PicamEvent::ScreenChanged { from, to } => format!("Screen {:?} -> {:?}", from, to),
            PicamEvent::CaptureStarted { .. } => "Capture started".to_string(),
            PicamEvent::CaptureCompleted { path } => {
                format!("Capture completed: {}", path.display())
            }
            PicamEvent::CaptureFailed { error } => format!("Capture failed: {}", error),
            PicamEvent::HardwareFault { component, details } => {
                format!("Hardware fault in {}: {}", component, details)
            }
            PicamEvent::StorageWarning { active } => {
                format!("Storage warning {}", if *active { "raised" } else { "cleared" })
            }
            PicamEvent::ShutdownRequested { reason } => format!("Shutdown requested: {}", reason),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            PicamEvent::InputReceived { .. } => "input_received",
            PicamEvent::ScreenChanged { .. } => "screen_changed",
            PicamEvent::CaptureStarted { .. } => "capture_started",
            PicamEvent::CaptureCompleted { .. } => "capture_completed",
            PicamEvent::CaptureFailed { .. } => "capture_failed",
            PicamEvent::HardwareFault { .. } => "hardware_fault",
            PicamEvent::StorageWarning { .. } => "storage_warning",
            PicamEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },
}

/// Async event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<PicamEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<PicamEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: PicamEvent) -> Result<usize, EventBusError> {
        match &event {
            PicamEvent::CaptureCompleted { path } => {
                info!("Photo saved: {}", path.display());
            }
            PicamEvent::CaptureFailed { error } => {
                warn!("Capture failed: {}", error);
            }
            PicamEvent::HardwareFault { component, details } => {
                error!("Hardware fault in {}: {}", component, details);
            }
            PicamEvent::ShutdownRequested { reason } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => debug!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new(8);
        let mut receiver = bus.subscribe();

        bus.publish(PicamEvent::StorageWarning { active: true })
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "storage_warning");
        assert_eq!(event.description(), "Storage warning raised");
    }

    #[test]
    fn test_publish_without_subscribers_fails() {
        let bus = EventBus::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus
            .publish(PicamEvent::ShutdownRequested {
                reason: "test".to_string()
            })
            .is_err());
    }
}
