//! Error types for the latent-space subsystem.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid perturbation scale: sigma = {0}")]
    InvalidSigma(f64),

    /// Model artifacts are missing or unreadable.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Failure inside an encode or decode forward computation.
    #[error("Inference error: {0}")]
    ModelInference(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True for failures caused by the caller's request rather than the model.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::InvalidSigma(_) | Error::InvalidConfig(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
