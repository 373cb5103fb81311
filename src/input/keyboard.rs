use super::lines::LineReader;
use super::types::{Direction, LineMask};
use crate::error::InputError;
use crate::events::{EventBus, PicamEvent};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Terminal arrow keys standing in for the button pad.
///
/// Terminals only report key presses, so each press holds its line
/// asserted for `hold` and key repeat keeps it asserted. Holding a key
/// long enough therefore produces a long press.
pub struct KeyboardLines {
    hold: Duration,
    latched_until: [Option<Instant>; 5],
    event_bus: Option<Arc<EventBus>>,
    raw_mode: bool,
}

impl KeyboardLines {
    pub fn new(hold: Duration, event_bus: Option<Arc<EventBus>>) -> Result<Self, InputError> {
        enable_raw_mode().map_err(|e| InputError::DeviceOpen {
            device: "terminal".to_string(),
            details: e.to_string(),
        })?;

        info!("Keyboard input active: arrows move, Enter/Space select, q quits");

        Ok(Self {
            hold,
            latched_until: [None; 5],
            event_bus,
            raw_mode: true,
        })
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        match direction_for_key(key.code) {
            Some(direction) => {
                self.latched_until[direction.bit() as usize] = Some(now + self.hold);
            }
            None if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) => {
                info!("Quit key pressed - requesting shutdown");
                if let Some(bus) = &self.event_bus {
                    if let Err(e) = bus.publish(PicamEvent::ShutdownRequested {
                        reason: "User requested via keyboard".to_string(),
                    }) {
                        warn!("Failed to publish shutdown event: {}", e);
                    }
                }
            }
            None => debug!("Key pressed: {:?}", key.code),
        }
    }

    fn mask_at(&self, now: Instant) -> LineMask {
        Direction::ALL
            .into_iter()
            .filter(|d| matches!(self.latched_until[d.bit() as usize], Some(until) if until > now))
            .collect()
    }
}

fn direction_for_key(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => Some(Direction::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Direction::Center),
        _ => None,
    }
}

impl LineReader for KeyboardLines {
    fn read_lines(&mut self) -> Result<LineMask, InputError> {
        let now = Instant::now();
        loop {
            let ready = event::poll(Duration::ZERO).map_err(|e| InputError::DeviceRead {
                details: e.to_string(),
            })?;
            if !ready {
                break;
            }
            match event::read() {
                Ok(Event::Key(key)) => self.handle_key(key, now),
                Ok(_) => {}
                Err(e) => {
                    return Err(InputError::DeviceRead {
                        details: e.to_string(),
                    })
                }
            }
        }
        Ok(self.mask_at(now))
    }

    fn name(&self) -> &str {
        "keyboard"
    }
}

impl Drop for KeyboardLines {
    fn drop(&mut self) {
        if self.raw_mode {
            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn lines() -> KeyboardLines {
        KeyboardLines {
            hold: Duration::from_millis(120),
            latched_until: [None; 5],
            event_bus: None,
            raw_mode: false,
        }
    }

    #[test]
    fn test_key_press_latches_line() {
        let mut lines = lines();
        let now = Instant::now();
        lines.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE), now);

        assert!(lines.mask_at(now).is_asserted(Direction::Left));
        assert!(lines
            .mask_at(now + Duration::from_millis(100))
            .is_asserted(Direction::Left));
        assert!(lines.mask_at(now + Duration::from_millis(121)).is_empty());
    }

    #[test]
    fn test_quit_key_publishes_shutdown() {
        let bus = Arc::new(EventBus::new(4));
        let mut receiver = bus.subscribe();
        let mut lines = lines();
        lines.event_bus = Some(Arc::clone(&bus));

        lines.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE), Instant::now());

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.event_type(), "shutdown_requested");
    }
}
