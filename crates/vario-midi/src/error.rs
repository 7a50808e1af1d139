//! Error types for the note sequence subsystem.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A note event violated a construction constraint. `index` is the
    /// position of the offending event in the caller's input.
    #[error("Invalid note event at index {index}: {reason}")]
    InvalidEvent { index: usize, reason: String },

    /// Rounding onto the step grid collapsed a note to zero length.
    #[error("Note {index} (pitch {pitch}) collapses to zero duration at step {step}")]
    DegenerateNote { index: usize, pitch: u8, step: u32 },

    #[error("Invalid quantization resolution: {0} steps per quarter")]
    InvalidResolution(u32),

    /// Sequence-level metadata (tempo, tick resolution, total time) is unusable.
    #[error("Invalid sequence metadata: {0}")]
    InvalidMetadata(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI parse error: {0}")]
    MidiFileParse(String),

    #[error("Unsupported MIDI timing format")]
    MidiUnsupportedTiming,
}

impl Error {
    pub(crate) fn invalid_event(index: usize, reason: impl Into<String>) -> Self {
        Error::InvalidEvent {
            index,
            reason: reason.into(),
        }
    }

    /// True for failures caused by the caller's notes or settings rather than I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidEvent { .. }
                | Error::DegenerateNote { .. }
                | Error::InvalidResolution(_)
                | Error::InvalidMetadata(_)
        )
    }
}

impl From<midly::Error> for Error {
    fn from(e: midly::Error) -> Self {
        Error::MidiFileParse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
