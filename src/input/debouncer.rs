use super::lines::LineReader;
use super::types::{Direction, InputEvent, InputKind, LineFault, LineMask};
use crate::config::InputConfig;
use crate::error::InputError;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timing windows for the per-line state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTiming {
    pub debounce: Duration,
    pub long_press: Duration,
    pub stuck_line: Duration,
}

impl Default for DebounceTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(20),
            long_press: Duration::from_millis(600),
            stuck_line: Duration::from_secs(5),
        }
    }
}

impl From<&InputConfig> for DebounceTiming {
    fn from(config: &InputConfig) -> Self {
        Self {
            debounce: config.debounce(),
            long_press: config.long_press(),
            stuck_line: config.stuck_line(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Idle,
    /// Raw line asserted, waiting for it to stay put
    Debouncing { since: Instant },
    /// Stable press; the PRESS event is held back until release or long press
    Pressed { since: Instant },
    LongPressed { since: Instant },
    /// Raw line dropped while pressed, waiting for it to stay released
    Releasing {
        pressed_since: Instant,
        low_since: Instant,
        long: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct LineTracker {
    direction: Direction,
    state: LineState,
    stuck: bool,
}

impl LineTracker {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: LineState::Idle,
            stuck: false,
        }
    }

    fn step(
        &mut self,
        asserted: bool,
        now: Instant,
        timing: &DebounceTiming,
        events: &mut Vec<InputEvent>,
        faults: &mut Vec<LineFault>,
    ) {
        let direction = self.direction;
        let emit = |events: &mut Vec<InputEvent>, kind| {
            events.push(InputEvent::new(direction, kind, now));
        };

        self.state = match (self.state, asserted) {
            (LineState::Idle, false) => LineState::Idle,
            (LineState::Idle, true) => LineState::Debouncing { since: now },

            (LineState::Debouncing { .. }, false) => LineState::Idle,
            (LineState::Debouncing { since }, true) => {
                if now.duration_since(since) >= timing.debounce {
                    LineState::Pressed { since }
                } else {
                    LineState::Debouncing { since }
                }
            }

            (LineState::Pressed { since }, true) => {
                if now.duration_since(since) >= timing.long_press {
                    emit(events, InputKind::LongPress);
                    LineState::LongPressed { since }
                } else {
                    LineState::Pressed { since }
                }
            }
            (LineState::Pressed { since }, false) => LineState::Releasing {
                pressed_since: since,
                low_since: now,
                long: false,
            },

            (LineState::LongPressed { since }, true) => {
                if !self.stuck && now.duration_since(since) >= timing.stuck_line {
                    self.stuck = true;
                    faults.push(LineFault::Stuck(direction));
                }
                LineState::LongPressed { since }
            }
            (LineState::LongPressed { since }, false) => LineState::Releasing {
                pressed_since: since,
                low_since: now,
                long: true,
            },

            (LineState::Releasing { pressed_since, long, .. }, true) => {
                if long {
                    LineState::LongPressed {
                        since: pressed_since,
                    }
                } else {
                    LineState::Pressed {
                        since: pressed_since,
                    }
                }
            }
            (
                LineState::Releasing {
                    pressed_since,
                    low_since,
                    long,
                },
                false,
            ) => {
                if now.duration_since(low_since) >= timing.debounce {
                    if !long {
                        emit(events, InputKind::Press);
                    }
                    emit(events, InputKind::Release);
                    if self.stuck {
                        self.stuck = false;
                        faults.push(LineFault::Cleared(direction));
                    }
                    LineState::Idle
                } else {
                    LineState::Releasing {
                        pressed_since,
                        low_since,
                        long,
                    }
                }
            }
        };
    }
}

/// Turns raw line snapshots into clean press / long-press / release events
pub struct InputDebouncer {
    reader: Box<dyn LineReader>,
    timing: DebounceTiming,
    lines: [LineTracker; 5],
    pending: Vec<InputEvent>,
    faults: Vec<LineFault>,
}

impl InputDebouncer {
    pub fn new(reader: Box<dyn LineReader>, timing: DebounceTiming) -> Self {
        debug!(
            "Input debouncer on {} (debounce {:?}, long press {:?})",
            reader.name(),
            timing.debounce,
            timing.long_press
        );
        Self {
            reader,
            timing,
            lines: Direction::ALL.map(LineTracker::new),
            pending: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn timing(&self) -> &DebounceTiming {
        &self.timing
    }

    /// Sample the lines once and yield whatever events that produced
    pub fn poll(&mut self) -> Result<std::vec::Drain<'_, InputEvent>, InputError> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(
        &mut self,
        now: Instant,
    ) -> Result<std::vec::Drain<'_, InputEvent>, InputError> {
        let mask = self.reader.read_lines()?;
        self.sample(mask, now);
        Ok(self.pending.drain(..))
    }

    /// Feed one raw snapshot through every line state machine
    pub fn sample(&mut self, mask: LineMask, now: Instant) {
        for line in self.lines.iter_mut() {
            let asserted = mask.is_asserted(line.direction);
            line.step(
                asserted,
                now,
                &self.timing,
                &mut self.pending,
                &mut self.faults,
            );
        }
    }

    /// Events produced by [`sample`](Self::sample) and not yet taken
    pub fn take_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn drain_faults(&mut self) -> Vec<LineFault> {
        let faults = std::mem::take(&mut self.faults);
        for fault in &faults {
            match fault {
                LineFault::Stuck(direction) => {
                    warn!("Input line {} stuck asserted", direction)
                }
                LineFault::Cleared(direction) => debug!("Input line {} released", direction),
            }
        }
        faults
    }

    /// Lines currently held past the debounce window
    pub fn held(&self) -> LineMask {
        self.lines
            .iter()
            .filter(|line| {
                matches!(
                    line.state,
                    LineState::Pressed { .. } | LineState::LongPressed { .. }
                )
            })
            .map(|line| line.direction)
            .collect()
    }
}
