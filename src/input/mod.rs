mod debouncer;
mod handler;
mod keyboard;
mod lines;
mod mock;
mod types;

#[cfg(test)]
mod tests;

pub use debouncer::{DebounceTiming, InputDebouncer};
pub use handler::InputTask;
pub use keyboard::KeyboardLines;
#[cfg(all(feature = "input", target_os = "linux"))]
pub use lines::EvdevLines;
pub use lines::LineReader;
pub use mock::ScriptedLines;
pub use types::{Direction, InputEvent, InputKind, InputMessage, LineFault, LineMask};

use crate::config::{InputBackend, InputConfig};
use crate::error::InputError;
use crate::events::EventBus;
use std::sync::Arc;

/// Open the line reader selected by configuration
pub fn open_line_reader(
    config: &InputConfig,
    event_bus: Arc<EventBus>,
) -> Result<Box<dyn LineReader>, InputError> {
    match config.backend {
        InputBackend::Evdev => open_evdev(&config.device),
        InputBackend::Keyboard => Ok(Box::new(KeyboardLines::new(
            std::time::Duration::from_millis(config.keyboard_hold_ms),
            Some(event_bus),
        )?)),
        InputBackend::ScriptedIdle => Ok(Box::new(ScriptedLines::idle())),
    }
}

#[cfg(all(feature = "input", target_os = "linux"))]
fn open_evdev(device: &str) -> Result<Box<dyn LineReader>, InputError> {
    Ok(Box::new(EvdevLines::open(device)?))
}

#[cfg(not(all(feature = "input", target_os = "linux")))]
fn open_evdev(device: &str) -> Result<Box<dyn LineReader>, InputError> {
    Err(InputError::NotAvailable(format!(
        "evdev support not compiled in (device {})",
        device
    )))
}
