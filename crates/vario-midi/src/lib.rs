//! Symbolic note sequences for vario.
//!
//! Provides the phrase types that flow through the mutation pipeline, the
//! quantizer that puts them on a model's step grid, and Standard MIDI File I/O.
//!
//! # Example
//!
//! ```
//! use vario_midi::{quantize, SequenceBuilder};
//!
//! let seq = SequenceBuilder::default()
//!     .note(60, 0.0, 1.0)
//!     .note(62, 1.0, 2.0)
//!     .build()?;
//!
//! // 120 qpm at 4 steps per quarter: 8 steps per second
//! let q = quantize(&seq, 4)?;
//! assert_eq!(q.total_steps(), 16);
//! # Ok::<(), vario_midi::Error>(())
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

pub use file::{encode_midi, parse_midi, read_midi, write_midi};
pub use note::{NoteEvent, DEFAULT_VELOCITY, MAX_PITCH};
pub use quantize::{quantize, QuantizedNote, QuantizedSequence, Quantizer};
pub use sequence::{
    build, NoteSequence, SequenceBuilder, DEFAULT_QPM, DEFAULT_TICKS_PER_QUARTER,
    MAX_TICKS_PER_QUARTER,
};

// Utility functions
pub use utils::{pitch_name, qpm_to_us_per_quarter, steps_per_second};

pub(crate) mod file;
pub(crate) mod note;
pub(crate) mod quantize;
pub(crate) mod sequence;
pub(crate) mod utils;
