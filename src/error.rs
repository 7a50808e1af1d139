//! Centralized error type for the vario umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate
//! boundaries. Subsystem errors pass through unchanged: matching on
//! `Error::Midi(..)` or `Error::Neural(..)` recovers the exact failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Midi(#[from] vario_midi::Error),

    #[error(transparent)]
    Neural(#[from] vario_neural::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Caller-input failures (bad notes, resolution, sigma, settings), as
    /// opposed to model or file-system failures. Neither kind is retried.
    pub fn is_input_error(&self) -> bool {
        match self {
            Error::Midi(e) => e.is_input_error(),
            Error::Neural(e) => e.is_input_error(),
            Error::InvalidConfig(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
