//! # vario - Melodic variations through a latent sequence model
//!
//! Encodes a phrase into a generative model's latent space, perturbs the
//! latent vector with seeded Gaussian noise, and decodes it back into a new
//! phrase.
//!
//! ## Architecture
//!
//! vario is an umbrella crate that coordinates:
//! - **vario-midi** - Note sequences, quantization, Standard MIDI File I/O
//! - **vario-neural** - Model gateway, checkpoint artifacts, latent mutation
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use vario::prelude::*;
//!
//! let model = LatticeModel::new(LatticeConfig::default())?;
//! let pipeline = MutationPipeline::builder()
//!     .gateway(Arc::new(model))
//!     .build()?;
//!
//! let melody = [(60, 0.0, 1.0), (62, 1.0, 2.0), (64, 2.0, 3.0), (65, 3.0, 4.0)];
//! let variant = pipeline.run(&melody, 4, &MutationRequest::seeded(0.5, 42))?;
//! assert!(!variant.is_empty());
//! # Ok::<(), vario::Error>(())
//! ```

/// Re-export of vario-midi for direct access
pub use vario_midi as midi;

/// Re-export of vario-neural for direct access
pub use vario_neural as neural;

mod builder;
mod error;
mod pipeline;

pub use builder::MutationPipelineBuilder;
pub use error::{Error, Result};
pub use pipeline::{MutationPipeline, Variation};

// Sequence types
pub use vario_midi::{
    quantize, read_midi, write_midi, NoteEvent, NoteSequence, QuantizedSequence, Quantizer,
    SequenceBuilder,
};

// Latent side
pub use vario_neural::{
    mutate, LatentMutator, LatentVector, LatticeConfig, LatticeModel, ModelArtifacts,
    ModelGateway, MutationRequest,
};

pub mod prelude {
    // Main pipeline
    pub use crate::{MutationPipeline, MutationPipelineBuilder, Variation};

    // Sequences
    pub use crate::midi::{NoteEvent, NoteSequence, QuantizedSequence, SequenceBuilder};

    // Model and mutation
    pub use crate::neural::{
        LatentVector, LatticeConfig, LatticeModel, ModelArtifacts, ModelGateway, MutationRequest,
    };
}
