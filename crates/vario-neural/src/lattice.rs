//! Deterministic reference gateway.
//!
//! [`LatticeModel`] is a weight-free [`ModelGateway`]: its latent space is the
//! melody itself, one dimension per grid step. Each dimension holds a melody
//! token as a real number:
//!
//! | value | token |
//! |---|---|
//! | `0.0` | no event (the current note or rest continues) |
//! | `-1.0` | note off |
//! | `p` in `min_pitch..=max_pitch` | note on at MIDI pitch `p` |
//!
//! Decoding rounds each value half-up and maps anything that is neither a
//! note off nor an in-range pitch to "no event", so every vector decodes to a
//! well-formed monophonic melody and nearby vectors decode to similar ones.
//! The data converter settings of a checkpoint's `config.json` determine the
//! lattice length and pitch range.

use crate::artifacts::ModelArtifacts;
use crate::error::{Error, Result};
use crate::gateway::{check_latent_dim, ModelGateway};
use crate::latent::LatentVector;
use std::collections::BTreeMap;
use tracing::debug;
use vario_midi::{
    steps_per_second, NoteSequence, QuantizedNote, QuantizedSequence, SequenceBuilder,
    DEFAULT_QPM, MAX_PITCH,
};

const NO_EVENT: f32 = 0.0;
const NOTE_OFF: f32 = -1.0;

/// Converter this gateway understands in `config.json`.
pub const MELODY_CONVERTER: &str = "MelodyConverter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeConfig {
    /// Lattice length in steps; also the latent dimensionality.
    pub num_steps: usize,
    pub min_pitch: u8,
    pub max_pitch: u8,
    pub steps_per_quarter: u32,
}

impl Default for LatticeConfig {
    /// 16 bars of 4/4 at 4 steps per quarter over the piano range.
    fn default() -> Self {
        Self {
            num_steps: 256,
            min_pitch: 21,
            max_pitch: 108,
            steps_per_quarter: 4,
        }
    }
}

impl LatticeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_steps == 0 {
            return Err(Error::InvalidConfig("lattice needs at least one step".into()));
        }
        if self.steps_per_quarter == 0 {
            return Err(Error::InvalidConfig("steps per quarter must be positive".into()));
        }
        // Pitch 0 would collide with the no-event token
        if self.min_pitch == 0 || self.min_pitch > self.max_pitch || self.max_pitch > MAX_PITCH {
            return Err(Error::InvalidConfig(format!(
                "pitch range {}..={} must lie within 1..={MAX_PITCH}",
                self.min_pitch, self.max_pitch
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    NoEvent,
    NoteOff,
    NoteOn(u8),
}

/// Weight-free melody lattice gateway. See the [module docs](self).
#[derive(Debug, Clone)]
pub struct LatticeModel {
    name: String,
    config: LatticeConfig,
}

impl LatticeModel {
    pub fn new(config: LatticeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: "lattice".to_string(),
            config,
        })
    }

    /// Build from a checkpoint's melody converter settings.
    pub fn from_artifacts(artifacts: &ModelArtifacts) -> Result<Self> {
        let converter = &artifacts.config().data_converter;
        if converter.converter_type != MELODY_CONVERTER {
            return Err(Error::ModelUnavailable(format!(
                "{} uses a {} data converter, expected {MELODY_CONVERTER}",
                artifacts.name(),
                converter.converter_type
            )));
        }

        let args = &converter.args;
        let mut model = Self::new(LatticeConfig {
            num_steps: args.num_steps,
            min_pitch: args.min_pitch,
            max_pitch: args.max_pitch,
            steps_per_quarter: args.steps_per_quarter,
        })
        .map_err(|e| Error::ModelUnavailable(format!("{}: {e}", artifacts.name())))?;
        model.name = format!("lattice/{}", artifacts.name());
        Ok(model)
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    fn encode_sequence(&self, index: usize, seq: &QuantizedSequence) -> Result<LatentVector> {
        let config = &self.config;
        if seq.steps_per_quarter() != config.steps_per_quarter {
            return Err(Error::ModelInference(format!(
                "sequence {index} is quantized at {} steps per quarter, model expects {}",
                seq.steps_per_quarter(),
                config.steps_per_quarter
            )));
        }

        // One onset per step; the highest pitch wins a shared onset
        let mut onsets = BTreeMap::new();
        for note in seq.notes() {
            if note.pitch < config.min_pitch || note.pitch > config.max_pitch {
                return Err(Error::ModelInference(format!(
                    "sequence {index}: pitch {} outside model range {}..={}",
                    note.pitch, config.min_pitch, config.max_pitch
                )));
            }
            if note.end_step as usize > config.num_steps {
                return Err(Error::ModelInference(format!(
                    "sequence {index} runs to step {}, model holds {} steps",
                    note.end_step, config.num_steps
                )));
            }
            onsets
                .entry(note.start_step)
                .and_modify(|n: &mut QuantizedNote| {
                    if note.pitch > n.pitch {
                        *n = *note;
                    }
                })
                .or_insert(*note);
        }

        let mut lattice = vec![NO_EVENT; config.num_steps];
        let starts: Vec<u32> = onsets.keys().copied().collect();
        for (i, note) in onsets.values().enumerate() {
            lattice[note.start_step as usize] = note.pitch as f32;
            let next_onset = starts.get(i + 1).copied().unwrap_or(u32::MAX);
            // A following onset cuts the note; otherwise it is released
            if note.end_step < next_onset && (note.end_step as usize) < config.num_steps {
                lattice[note.end_step as usize] = NOTE_OFF;
            }
        }

        Ok(LatentVector::new(lattice))
    }

    fn token(&self, value: f32) -> Token {
        let rounded = (value as f64 + 0.5).floor();
        if rounded <= NOTE_OFF as f64 {
            Token::NoteOff
        } else if rounded >= self.config.min_pitch as f64 && rounded <= self.config.max_pitch as f64
        {
            Token::NoteOn(rounded as u8)
        } else {
            Token::NoEvent
        }
    }

    fn decode_latent(&self, index: usize, latent: &LatentVector) -> Result<NoteSequence> {
        check_latent_dim(latent, self.config.num_steps)?;
        if !latent.is_finite() {
            return Err(Error::ModelInference(format!(
                "latent {index} contains non-finite values"
            )));
        }

        let mut notes: Vec<(u8, usize, usize)> = Vec::new();
        let mut sounding: Option<(u8, usize)> = None;
        for (step, &value) in latent.iter().enumerate() {
            match self.token(value) {
                Token::NoEvent => {}
                Token::NoteOff => {
                    if let Some((pitch, start)) = sounding.take() {
                        notes.push((pitch, start, step));
                    }
                }
                Token::NoteOn(pitch) => {
                    if let Some((prev, start)) = sounding.replace((pitch, step)) {
                        notes.push((prev, start, step));
                    }
                }
            }
        }
        if let Some((pitch, start)) = sounding {
            notes.push((pitch, start, self.config.num_steps));
        }

        if notes.is_empty() {
            return Err(Error::ModelInference(format!(
                "latent {index} decoded an empty sequence"
            )));
        }

        let sps = steps_per_second(self.config.steps_per_quarter, DEFAULT_QPM);
        notes
            .iter()
            .fold(SequenceBuilder::new().qpm(DEFAULT_QPM), |b, &(pitch, start, end)| {
                b.note(pitch, start as f64 / sps, end as f64 / sps)
            })
            .build()
            .map_err(|e| Error::ModelInference(format!("latent {index}: {e}")))
    }
}

impl ModelGateway for LatticeModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn latent_dim(&self) -> usize {
        self.config.num_steps
    }

    fn steps_per_quarter(&self) -> u32 {
        self.config.steps_per_quarter
    }

    fn encode(&self, sequences: &[QuantizedSequence]) -> Result<Vec<LatentVector>> {
        debug!("{}: encoding {} sequences", self.name, sequences.len());
        sequences
            .iter()
            .enumerate()
            .map(|(i, seq)| self.encode_sequence(i, seq))
            .collect()
    }

    fn decode(&self, latents: &[LatentVector]) -> Result<Vec<NoteSequence>> {
        debug!("{}: decoding {} latents", self.name, latents.len());
        latents
            .iter()
            .enumerate()
            .map(|(i, latent)| self.decode_latent(i, latent))
            .collect()
    }
}
