use super::lines::LineReader;
use super::types::LineMask;
use crate::error::InputError;
use std::collections::VecDeque;

/// Replays a fixed sequence of line snapshots, one per read.
///
/// Once the script runs out the last snapshot repeats, so an idle
/// script stays idle forever.
pub struct ScriptedLines {
    script: VecDeque<LineMask>,
    last: LineMask,
    fail_next: Option<String>,
}

impl ScriptedLines {
    pub fn new<I: IntoIterator<Item = LineMask>>(samples: I) -> Self {
        Self {
            script: samples.into_iter().collect(),
            last: LineMask::NONE,
            fail_next: None,
        }
    }

    /// No line ever asserted
    pub fn idle() -> Self {
        Self::new(std::iter::empty())
    }

    /// Build a script from `(mask, sample_count)` runs
    pub fn from_segments(segments: &[(LineMask, usize)]) -> Self {
        Self::new(
            segments
                .iter()
                .flat_map(|(mask, count)| std::iter::repeat(*mask).take(*count)),
        )
    }

    /// Make the next read fail with a device error
    pub fn fail_next_read<S: Into<String>>(&mut self, details: S) {
        self.fail_next = Some(details.into());
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LineReader for ScriptedLines {
    fn read_lines(&mut self) -> Result<LineMask, InputError> {
        if let Some(details) = self.fail_next.take() {
            return Err(InputError::DeviceRead { details });
        }
        if let Some(mask) = self.script.pop_front() {
            self.last = mask;
        }
        Ok(self.last)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
