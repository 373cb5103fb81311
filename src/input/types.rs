use std::fmt;
use std::time::Instant;

/// One of the five pad lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Center,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::Center,
    ];

    /// Bit position inside a [`LineMask`]
    pub fn bit(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
            Direction::Center => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
            Direction::Center => "CENTER",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Press,
    LongPress,
    Release,
}

/// A debounced pad event. Consumed exactly once by the active app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub direction: Direction,
    pub kind: InputKind,
    pub timestamp: Instant,
}

impl InputEvent {
    pub fn new(direction: Direction, kind: InputKind, timestamp: Instant) -> Self {
        Self {
            direction,
            kind,
            timestamp,
        }
    }

    pub fn press(direction: Direction) -> Self {
        Self::new(direction, InputKind::Press, Instant::now())
    }

    pub fn long_press(direction: Direction) -> Self {
        Self::new(direction, InputKind::LongPress, Instant::now())
    }

    pub fn release(direction: Direction) -> Self {
        Self::new(direction, InputKind::Release, Instant::now())
    }

    /// Press or long press, the two kinds that trigger actions
    pub fn is_activation(&self) -> bool {
        matches!(self.kind, InputKind::Press | InputKind::LongPress)
    }
}

/// Raw snapshot of the five lines, one bit per [`Direction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineMask(u8);

impl LineMask {
    pub const NONE: LineMask = LineMask(0);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1_1111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn only(direction: Direction) -> Self {
        Self(1 << direction.bit())
    }

    pub fn with(self, direction: Direction) -> Self {
        Self(self.0 | (1 << direction.bit()))
    }

    pub fn is_asserted(self, direction: Direction) -> bool {
        self.0 & (1 << direction.bit()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Direction> for LineMask {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter().fold(LineMask::NONE, LineMask::with)
    }
}

/// Stuck-line reports from the debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFault {
    /// Line asserted past the sanity ceiling
    Stuck(Direction),
    /// A previously stuck line released
    Cleared(Direction),
}

/// What the input task forwards to the UI loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMessage {
    Event(InputEvent),
    Fault(LineFault),
}
