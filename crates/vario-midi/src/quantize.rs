//! Quantization onto a step grid.
//!
//! The generative model only accepts phrases on the discrete grid it was
//! trained on, so every sequence is snapped before encoding. Boundaries are
//! converted from seconds to steps with
//! `steps_per_second = steps_per_quarter * qpm / 60` and rounded half-up.
//! A note whose start and end land on the same step is rejected rather than
//! stretched.

use crate::error::{Error, Result};
use crate::note::NoteEvent;
use crate::sequence::{NoteSequence, SequenceBuilder};
use crate::utils::{round_half_up, steps_per_second};
use serde::Serialize;
use tracing::debug;

/// A note with integer step boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantizedNote {
    pub pitch: u8,
    pub velocity: u8,
    pub start_step: u32,
    pub end_step: u32,
}

impl QuantizedNote {
    pub fn duration_steps(&self) -> u32 {
        self.end_step - self.start_step
    }
}

/// A [`NoteSequence`] snapped to a grid of `steps_per_quarter` steps per quarter note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantizedSequence {
    notes: Vec<QuantizedNote>,
    steps_per_quarter: u32,
    total_steps: u32,
    sequence: NoteSequence,
}

impl QuantizedSequence {
    /// Notes in the order of the source sequence.
    pub fn notes(&self) -> &[QuantizedNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn steps_per_quarter(&self) -> u32 {
        self.steps_per_quarter
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn qpm(&self) -> f64 {
        self.sequence.qpm()
    }

    pub fn steps_per_second(&self) -> f64 {
        steps_per_second(self.steps_per_quarter, self.sequence.qpm())
    }

    /// The snapped sequence, times in seconds.
    pub fn as_note_sequence(&self) -> &NoteSequence {
        &self.sequence
    }

    pub fn to_note_sequence(&self) -> NoteSequence {
        self.sequence.clone()
    }
}

/// Quantizer bound to one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    steps_per_quarter: u32,
}

impl Quantizer {
    pub fn new(steps_per_quarter: u32) -> Result<Self> {
        if steps_per_quarter == 0 {
            return Err(Error::InvalidResolution(steps_per_quarter));
        }
        Ok(Self { steps_per_quarter })
    }

    pub fn steps_per_quarter(&self) -> u32 {
        self.steps_per_quarter
    }

    pub fn quantize(&self, seq: &NoteSequence) -> Result<QuantizedSequence> {
        quantize(seq, self.steps_per_quarter)
    }
}

/// Snap every note of `seq` onto the step grid.
pub fn quantize(seq: &NoteSequence, steps_per_quarter: u32) -> Result<QuantizedSequence> {
    if steps_per_quarter == 0 {
        return Err(Error::InvalidResolution(steps_per_quarter));
    }

    let sps = steps_per_second(steps_per_quarter, seq.qpm());
    let to_step = |seconds: f64| -> Result<u32> {
        let step = round_half_up(seconds * sps);
        if step > u32::MAX as f64 {
            return Err(Error::InvalidMetadata(format!(
                "{seconds}s exceeds the step range at {steps_per_quarter} steps per quarter"
            )));
        }
        Ok(step as u32)
    };

    let notes = seq
        .notes()
        .iter()
        .enumerate()
        .map(|(index, note)| quantize_note(index, note, &to_step))
        .collect::<Result<Vec<_>>>()?;

    let last_end = notes.iter().map(|n| n.end_step).max().unwrap_or(0);
    let total_steps = to_step(seq.total_time())?.max(last_end);

    let mut builder = SequenceBuilder::new()
        .ticks_per_quarter(seq.ticks_per_quarter())
        .qpm(seq.qpm())
        .total_time(total_steps as f64 / sps);
    for note in &notes {
        builder = builder.velocity(note.velocity).note(
            note.pitch,
            note.start_step as f64 / sps,
            note.end_step as f64 / sps,
        );
    }
    let sequence = builder.build()?;

    debug!(
        "Quantized {} notes at {} steps/quarter: {} steps total",
        notes.len(),
        steps_per_quarter,
        total_steps
    );

    Ok(QuantizedSequence {
        notes,
        steps_per_quarter,
        total_steps,
        sequence,
    })
}

fn quantize_note(
    index: usize,
    note: &NoteEvent,
    to_step: &impl Fn(f64) -> Result<u32>,
) -> Result<QuantizedNote> {
    let start_step = to_step(note.start_time())?;
    let end_step = to_step(note.end_time())?;
    if end_step <= start_step {
        return Err(Error::DegenerateNote {
            index,
            pitch: note.pitch(),
            step: start_step,
        });
    }
    Ok(QuantizedNote {
        pitch: note.pitch(),
        velocity: note.velocity(),
        start_step,
        end_step,
    })
}
