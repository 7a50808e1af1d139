//! A single timed note.

use crate::error::{Error, Result};
use crate::utils::pitch_name;
use serde::Serialize;
use std::fmt;

/// Highest valid MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// Velocity given to notes that don't specify one.
pub const DEFAULT_VELOCITY: u8 = 100;

/// A note with absolute start and end times in seconds.
///
/// Immutable once created: construct through [`NoteEvent::new`] (or a
/// [`SequenceBuilder`](crate::SequenceBuilder)), which guarantees
/// `pitch <= 127`, `0 <= start_time < end_time` and finite times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoteEvent {
    pitch: u8,
    velocity: u8,
    start_time: f64,
    end_time: f64,
}

impl NoteEvent {
    pub fn new(pitch: u8, start_time: f64, end_time: f64) -> Result<Self> {
        Self::validated(0, pitch, start_time, end_time)
    }

    /// Validate one event; `index` is reported back in the error.
    pub(crate) fn validated(index: usize, pitch: u8, start_time: f64, end_time: f64) -> Result<Self> {
        if pitch > MAX_PITCH {
            return Err(Error::invalid_event(
                index,
                format!("pitch {pitch} outside 0..={MAX_PITCH}"),
            ));
        }
        if !start_time.is_finite() || !end_time.is_finite() {
            return Err(Error::invalid_event(index, "note times must be finite"));
        }
        if start_time < 0.0 {
            return Err(Error::invalid_event(
                index,
                format!("start time {start_time} is negative"),
            ));
        }
        if end_time <= start_time {
            return Err(Error::invalid_event(
                index,
                format!("end time {end_time} is not after start time {start_time}"),
            ));
        }

        Ok(Self {
            pitch,
            velocity: DEFAULT_VELOCITY,
            start_time,
            end_time,
        })
    }

    /// Returns a copy with a different velocity (clamped to 1..=127).
    pub fn with_velocity(self, velocity: u8) -> Self {
        Self {
            velocity: velocity.clamp(1, MAX_PITCH),
            ..self
        }
    }

    #[inline]
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    #[inline]
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    #[inline]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    #[inline]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:.3}s, {:.3}s)",
            pitch_name(self.pitch),
            self.start_time,
            self.end_time
        )
    }
}
