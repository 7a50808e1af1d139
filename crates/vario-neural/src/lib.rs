//! Latent-space side of vario: model gateway, artifacts and mutation.
//!
//! The generative model is opaque here. Everything the pipeline needs from it
//! goes through the [`ModelGateway`] trait (batch encode/decode plus the
//! latent dimensionality); [`LatticeModel`] is a deterministic reference
//! implementation. [`LatentMutator`] perturbs latents with seeded Gaussian
//! noise.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vario_neural::{LatticeModel, ModelArtifacts, ModelGateway, MutationRequest, mutate};
//!
//! let artifacts = ModelArtifacts::open("models/mel_16bar_small_q2")?;
//! let model = LatticeModel::from_artifacts(&artifacts)?;
//!
//! let z = model.encode_one(&quantized)?;
//! let z = mutate(&z, &MutationRequest::seeded(0.5, 42))?;
//! let variant = model.decode_one(&z)?;
//! ```

// Error types
mod error;
pub use error::{Error, Result};

mod latent;
pub use latent::LatentVector;

// Gateway trait and reference model
mod gateway;
pub use gateway::{check_latent_dim, ModelGateway};

mod lattice;
pub use lattice::{LatticeConfig, LatticeModel, MELODY_CONVERTER};

// Checkpoint files
mod artifacts;
pub use artifacts::{
    ConverterArgs, DataConverterConfig, ModelArtifacts, ModelConfig, WeightGroup, WeightSpec,
    WeightsManifest, CONFIG_FILE, DEFAULT_MODEL_DIR, DEFAULT_MODEL_NAME, MANIFEST_FILE,
};

mod fetch;
pub use fetch::{
    fetch_files, fetch_model, ArtifactSource, DirectorySource, FetchReport, FetchStatus,
    HttpSource, CHECKPOINT_URL,
};

// Mutation
mod mutate;
pub use mutate::{mutate, LatentMutator, MutationRequest, Perturbation, DEFAULT_SIGMA};

mod rng;
pub use rng::create_rng;
