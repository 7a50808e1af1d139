//! The encode → perturb → decode mutation pipeline.
//!
//! A straight-line composition: build → quantize → encode → mutate → decode.
//! Each stage runs to completion before the next starts, and the first
//! failure aborts the run with the stage's own error. There is no retry and
//! no partial output.

use crate::builder::MutationPipelineBuilder;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use vario_midi::{quantize, write_midi, NoteSequence, SequenceBuilder};
use vario_neural::{LatentMutator, ModelGateway, MutationRequest};

/// Entry point of the system. Cheap to clone; clones share the loaded model.
///
/// Runs are independent: each builds its own sequence, generator and
/// latents, so one pipeline may serve concurrent callers.
#[derive(Clone)]
pub struct MutationPipeline {
    pub(crate) inner: Arc<PipelineInner>,
}

pub(crate) struct PipelineInner {
    pub(crate) gateway: Arc<dyn ModelGateway>,
    pub(crate) mutator: LatentMutator,
    pub(crate) ticks_per_quarter: u32,
    pub(crate) qpm: f64,
}

/// One candidate of [`MutationPipeline::variations`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub sequence: NoteSequence,
    /// L2 norm of the noise that produced this candidate.
    pub latent_distance: f64,
}

impl MutationPipeline {
    pub fn builder() -> MutationPipelineBuilder {
        MutationPipelineBuilder::default()
    }

    pub fn gateway(&self) -> &Arc<dyn ModelGateway> {
        &self.inner.gateway
    }

    /// Mutate the phrase given as `(pitch, start, end)` events.
    pub fn run(
        &self,
        events: &[(u8, f64, f64)],
        steps_per_quarter: u32,
        request: &MutationRequest,
    ) -> Result<NoteSequence> {
        let seq = self.build_sequence(events)?;
        self.run_sequence(&seq, steps_per_quarter, request)
    }

    /// Mutate an existing sequence, e.g. one parsed from a MIDI file.
    pub fn run_sequence(
        &self,
        seq: &NoteSequence,
        steps_per_quarter: u32,
        request: &MutationRequest,
    ) -> Result<NoteSequence> {
        // Reject a bad sigma before paying for a forward pass
        request.validate()?;

        let quantized = quantize(seq, steps_per_quarter)?;
        let gateway = &self.inner.gateway;

        let latent = gateway.encode_one(&quantized)?;
        debug!("Encoded {} notes into {} dims", quantized.len(), latent.dim());

        let mutated = self.inner.mutator.mutate(&latent, request)?;
        let variant = gateway.decode_one(&mutated)?;

        info!(
            "Mutated {} notes into {} notes (sigma {}, seed {:?})",
            seq.len(),
            variant.len(),
            request.sigma,
            request.seed
        );
        Ok(variant)
    }

    /// Run and write the result as a Standard MIDI File.
    pub fn run_to_file(
        &self,
        events: &[(u8, f64, f64)],
        steps_per_quarter: u32,
        request: &MutationRequest,
        path: impl AsRef<Path>,
    ) -> Result<NoteSequence> {
        let variant = self.run(events, steps_per_quarter, request)?;
        write_midi(&variant, path)?;
        Ok(variant)
    }

    /// Generate `candidates` mutations and keep the `keep` closest to the
    /// input in latent space, nearest first.
    pub fn variations(
        &self,
        events: &[(u8, f64, f64)],
        steps_per_quarter: u32,
        request: &MutationRequest,
        candidates: usize,
        keep: usize,
    ) -> Result<Vec<Variation>> {
        let seq = self.build_sequence(events)?;
        self.variations_of(&seq, steps_per_quarter, request, candidates, keep)
    }

    pub fn variations_of(
        &self,
        seq: &NoteSequence,
        steps_per_quarter: u32,
        request: &MutationRequest,
        candidates: usize,
        keep: usize,
    ) -> Result<Vec<Variation>> {
        if candidates == 0 || keep == 0 {
            return Err(Error::InvalidConfig(format!(
                "need at least one candidate and one kept variation (got {candidates} and {keep})"
            )));
        }
        request.validate()?;

        let quantized = quantize(seq, steps_per_quarter)?;
        let gateway = &self.inner.gateway;
        let latent = gateway.encode_one(&quantized)?;

        let batch = self.inner.mutator.mutate_batch(&latent, request, candidates)?;
        let latents: Vec<_> = batch.iter().map(|p| p.latent.clone()).collect();
        let decoded = gateway.decode(&latents)?;
        if decoded.len() != latents.len() {
            return Err(vario_neural::Error::ModelInference(format!(
                "decode returned {} sequences for {} latents",
                decoded.len(),
                latents.len()
            ))
            .into());
        }

        let mut variations: Vec<Variation> = decoded
            .into_iter()
            .zip(&batch)
            .map(|(sequence, p)| Variation {
                sequence,
                latent_distance: p.noise_norm,
            })
            .collect();
        variations.sort_by(|a, b| a.latent_distance.total_cmp(&b.latent_distance));
        variations.truncate(keep.min(candidates));

        info!(
            "Kept {} of {} variations (sigma {})",
            variations.len(),
            candidates,
            request.sigma
        );
        Ok(variations)
    }

    fn build_sequence(&self, events: &[(u8, f64, f64)]) -> Result<NoteSequence> {
        Ok(SequenceBuilder::new()
            .ticks_per_quarter(self.inner.ticks_per_quarter)
            .qpm(self.inner.qpm)
            .events(events)
            .build()?)
    }
}
