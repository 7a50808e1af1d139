//! Note sequences and their builder.
//!
//! A [`NoteSequence`] is the symbolic phrase that flows through the mutation
//! pipeline: an unordered set of timed notes plus the timing metadata needed
//! to put them on a grid (tempo, tick resolution, total length).

use crate::error::{Error, Result};
use crate::note::{NoteEvent, DEFAULT_VELOCITY, MAX_PITCH};
use serde::Serialize;
use tracing::debug;

/// Tick resolution used when none is given.
pub const DEFAULT_TICKS_PER_QUARTER: u32 = 220;

/// Tempo used when none is given, in quarter notes per minute.
pub const DEFAULT_QPM: f64 = 120.0;

/// Largest tick resolution a Standard MIDI File header can carry.
pub const MAX_TICKS_PER_QUARTER: u32 = 0x7FFF;

/// An ordered collection of notes with timing metadata.
///
/// Invariants (upheld by [`SequenceBuilder`]):
/// - at least one note
/// - `total_time >= end_time` of every note
/// - `ticks_per_quarter` in `1..=32767`, `qpm` finite and positive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteSequence {
    notes: Vec<NoteEvent>,
    total_time: f64,
    ticks_per_quarter: u32,
    qpm: f64,
}

impl NoteSequence {
    pub fn builder() -> SequenceBuilder {
        SequenceBuilder::default()
    }

    /// Notes in insertion order.
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// Notes ordered by start time, then pitch.
    pub fn sorted_notes(&self) -> Vec<NoteEvent> {
        let mut notes = self.notes.clone();
        notes.sort_by(|a, b| {
            a.start_time()
                .total_cmp(&b.start_time())
                .then(a.pitch().cmp(&b.pitch()))
        });
        notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn ticks_per_quarter(&self) -> u32 {
        self.ticks_per_quarter
    }

    pub fn qpm(&self) -> f64 {
        self.qpm
    }

    /// Pitches in start-time order.
    pub fn pitches(&self) -> Vec<u8> {
        self.sorted_notes().iter().map(NoteEvent::pitch).collect()
    }

    /// Latest note end. Equal to `total_time` unless it was overridden.
    pub fn last_end_time(&self) -> f64 {
        self.notes
            .iter()
            .map(NoteEvent::end_time)
            .fold(0.0, f64::max)
    }
}

/// Builds a validated [`NoteSequence`] from `(pitch, start, end)` tuples.
///
/// # Example
///
/// ```
/// use vario_midi::SequenceBuilder;
///
/// let seq = SequenceBuilder::default()
///     .note(60, 0.0, 1.0)
///     .note(62, 1.0, 2.0)
///     .build()
///     .unwrap();
/// assert_eq!(seq.total_time(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    events: Vec<(u8, f64, f64, u8)>,
    total_time: Option<f64>,
    ticks_per_quarter: u32,
    qpm: f64,
    velocity: u8,
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            total_time: None,
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            qpm: DEFAULT_QPM,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

impl SequenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default: 220
    pub fn ticks_per_quarter(mut self, ticks: u32) -> Self {
        self.ticks_per_quarter = ticks;
        self
    }

    /// Default: 120.0
    pub fn qpm(mut self, qpm: f64) -> Self {
        self.qpm = qpm;
        self
    }

    /// Velocity for notes added after this call. Default: 100
    pub fn velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity.clamp(1, MAX_PITCH);
        self
    }

    /// Override the computed total time. Must not be shorter than the last note.
    pub fn total_time(mut self, seconds: f64) -> Self {
        self.total_time = Some(seconds);
        self
    }

    pub fn note(mut self, pitch: u8, start: f64, end: f64) -> Self {
        self.events.push((pitch, start, end, self.velocity));
        self
    }

    pub fn events(mut self, events: &[(u8, f64, f64)]) -> Self {
        let velocity = self.velocity;
        self.events
            .extend(events.iter().map(|&(p, s, e)| (p, s, e, velocity)));
        self
    }

    pub fn build(self) -> Result<NoteSequence> {
        if self.events.is_empty() {
            return Err(Error::invalid_event(0, "sequence has no notes"));
        }
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > MAX_TICKS_PER_QUARTER {
            return Err(Error::InvalidMetadata(format!(
                "ticks per quarter {} outside 1..={MAX_TICKS_PER_QUARTER}",
                self.ticks_per_quarter
            )));
        }
        if !self.qpm.is_finite() || self.qpm <= 0.0 {
            return Err(Error::InvalidMetadata(format!(
                "tempo {} qpm is not positive",
                self.qpm
            )));
        }

        let notes = self
            .events
            .iter()
            .enumerate()
            .map(|(index, &(pitch, start, end, velocity))| {
                NoteEvent::validated(index, pitch, start, end).map(|n| n.with_velocity(velocity))
            })
            .collect::<Result<Vec<_>>>()?;

        let last_end = notes.iter().map(NoteEvent::end_time).fold(0.0, f64::max);
        let total_time = match self.total_time {
            Some(t) if !t.is_finite() || t < last_end => {
                return Err(Error::InvalidMetadata(format!(
                    "total time {t} is shorter than the last note end {last_end}"
                )));
            }
            Some(t) => t,
            None => last_end,
        };

        debug!(
            "Built sequence: {} notes, {:.3}s, {} ticks/quarter, {} qpm",
            notes.len(),
            total_time,
            self.ticks_per_quarter,
            self.qpm
        );

        Ok(NoteSequence {
            notes,
            total_time,
            ticks_per_quarter: self.ticks_per_quarter,
            qpm: self.qpm,
        })
    }
}

/// Build a sequence from `(pitch, start, end)` events with default metadata.
pub fn build(events: &[(u8, f64, f64)]) -> Result<NoteSequence> {
    SequenceBuilder::default().events(events).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> Vec<(u8, f64, f64)> {
        vec![(60, 0.0, 1.0), (62, 1.0, 2.0), (64, 2.0, 3.0), (65, 3.0, 4.0)]
    }

    #[test]
    fn test_build_computes_total_time() {
        let seq = build(&scale()).unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.total_time(), 4.0);
        assert_eq!(seq.ticks_per_quarter(), DEFAULT_TICKS_PER_QUARTER);
        assert_eq!(seq.qpm(), DEFAULT_QPM);
    }

    #[test]
    fn test_build_empty_fails() {
        assert!(matches!(build(&[]), Err(Error::InvalidEvent { .. })));
    }

    #[test]
    fn test_build_end_before_start_fails() {
        let err = build(&[(60, 1.0, 0.5)]).unwrap_err();
        assert!(matches!(err, Error::InvalidEvent { index: 0, .. }));
    }

    #[test]
    fn test_error_names_offending_event() {
        let err = build(&[(60, 0.0, 1.0), (62, 1.0, 2.0), (200, 2.0, 3.0)]).unwrap_err();
        match err {
            Error::InvalidEvent { index, reason } => {
                assert_eq!(index, 2);
                assert!(reason.contains("200"));
            }
            other => panic!("Expected InvalidEvent, got {other:?}"),
        }
    }

    #[test]
    fn test_total_time_override() {
        let seq = SequenceBuilder::new()
            .events(&scale())
            .total_time(8.0)
            .build()
            .unwrap();
        assert_eq!(seq.total_time(), 8.0);
        assert_eq!(seq.last_end_time(), 4.0);

        let short = SequenceBuilder::new().events(&scale()).total_time(3.0).build();
        assert!(matches!(short, Err(Error::InvalidMetadata(_))));
    }

    #[test]
    fn test_invalid_metadata() {
        let zero_ticks = SequenceBuilder::new()
            .events(&scale())
            .ticks_per_quarter(0)
            .build();
        assert!(matches!(zero_ticks, Err(Error::InvalidMetadata(_))));

        let bad_tempo = SequenceBuilder::new().events(&scale()).qpm(-1.0).build();
        assert!(matches!(bad_tempo, Err(Error::InvalidMetadata(_))));
    }

    #[test]
    fn test_unsorted_notes_allowed() {
        let seq = build(&[(64, 2.0, 3.0), (60, 0.0, 1.0), (62, 1.0, 2.0)]).unwrap();
        assert_eq!(seq.notes()[0].pitch(), 64);
        assert_eq!(seq.pitches(), vec![60, 62, 64]);
    }

    #[test]
    fn test_velocity_applies_to_following_notes() {
        let seq = SequenceBuilder::new()
            .note(60, 0.0, 1.0)
            .velocity(64)
            .note(62, 1.0, 2.0)
            .build()
            .unwrap();
        assert_eq!(seq.notes()[0].velocity(), DEFAULT_VELOCITY);
        assert_eq!(seq.notes()[1].velocity(), 64);
    }

    #[test]
    fn test_serializes_to_json() {
        let seq = build(&[(60, 0.0, 0.5)]).unwrap();
        let json = serde_json::to_value(&seq).unwrap();
        assert_eq!(json["notes"][0]["pitch"], 60);
        assert_eq!(json["ticks_per_quarter"], 220);
    }
}
