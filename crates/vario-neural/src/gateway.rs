//! Model gateway abstraction - framework-agnostic encode/decode.
//!
//! Defines the [`ModelGateway`] trait that generative sequence models
//! implement. The pipeline sees nothing of a model beyond these two batch
//! operations and the latent dimensionality they agree on.

use crate::error::{Error, Result};
use crate::latent::LatentVector;
use std::slice;
use vario_midi::{NoteSequence, QuantizedSequence};

/// Boundary to a pretrained generative sequence model.
///
/// # Contract
///
/// - [`encode`](Self::encode) returns exactly one vector of length
///   [`latent_dim`](Self::latent_dim) per input sequence, in input order.
/// - [`decode`](Self::decode) returns exactly one sequence per input vector,
///   in input order.
/// - Missing or unreadable artifacts surface as [`Error::ModelUnavailable`];
///   anything failing inside a forward computation as
///   [`Error::ModelInference`].
///
/// # Thread Safety
///
/// Methods take `&self`: a loaded model is shared read-only (typically as
/// `Arc<dyn ModelGateway>`) and may serve concurrent pipeline runs.
/// Implementations may parallelize across batch elements internally as long
/// as output order matches input order.
pub trait ModelGateway: Send + Sync {
    /// e.g. "lattice", "music-vae/mel_16bar_small_q2"
    fn name(&self) -> &str;

    fn latent_dim(&self) -> usize;

    /// Resolution of the grid the model was trained on.
    fn steps_per_quarter(&self) -> u32;

    fn encode(&self, sequences: &[QuantizedSequence]) -> Result<Vec<LatentVector>>;

    fn decode(&self, latents: &[LatentVector]) -> Result<Vec<NoteSequence>>;

    /// Encode a single sequence (batch of one).
    fn encode_one(&self, sequence: &QuantizedSequence) -> Result<LatentVector> {
        let latents = self.encode(slice::from_ref(sequence))?;
        let latent = single(latents, "encode")?;
        if latent.dim() != self.latent_dim() {
            return Err(Error::ModelInference(format!(
                "encode produced a {}-dimensional vector, model declares {}",
                latent.dim(),
                self.latent_dim()
            )));
        }
        Ok(latent)
    }

    /// Decode a single vector (batch of one).
    fn decode_one(&self, latent: &LatentVector) -> Result<NoteSequence> {
        let sequences = self.decode(slice::from_ref(latent))?;
        single(sequences, "decode")
    }
}

fn single<T>(mut batch: Vec<T>, op: &str) -> Result<T> {
    if batch.len() != 1 {
        return Err(Error::ModelInference(format!(
            "{op} returned {} results for a batch of one",
            batch.len()
        )));
    }
    batch
        .pop()
        .ok_or_else(|| Error::ModelInference(format!("{op} returned no result")))
}

/// Reject a latent whose length differs from the model's dimensionality.
pub fn check_latent_dim(latent: &LatentVector, expected: usize) -> Result<()> {
    if latent.dim() != expected {
        return Err(Error::ModelInference(format!(
            "latent has {} dimensions, model expects {}",
            latent.dim(),
            expected
        )));
    }
    Ok(())
}
