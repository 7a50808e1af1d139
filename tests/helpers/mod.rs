//! Test helpers and fixtures for vario integration tests
//!
//! The pipeline is exercised against the deterministic lattice model, wrapped
//! in [`CountingGateway`] so tests can assert which stages reached the model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vario::neural::{LatentVector, Result as NeuralResult};
use vario::prelude::*;

/// The four-note phrase used throughout the tests.
pub const SCALE: [(u8, f64, f64); 4] = [
    (60, 0.0, 1.0),
    (62, 1.0, 2.0),
    (64, 2.0, 3.0),
    (65, 3.0, 4.0),
];

/// Standard grid for the tests: sixteenth notes.
pub const TEST_STEPS_PER_QUARTER: u32 = 4;

/// Delegates to a [`LatticeModel`] and counts every call.
pub struct CountingGateway {
    model: LatticeModel,
    encodes: AtomicUsize,
    decodes: AtomicUsize,
}

impl CountingGateway {
    pub fn new() -> Self {
        Self {
            model: LatticeModel::new(LatticeConfig::default()).expect("default lattice config"),
            encodes: AtomicUsize::new(0),
            decodes: AtomicUsize::new(0),
        }
    }

    pub fn encode_calls(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }

    pub fn decode_calls(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl ModelGateway for CountingGateway {
    fn name(&self) -> &str {
        "counting"
    }

    fn latent_dim(&self) -> usize {
        self.model.latent_dim()
    }

    fn steps_per_quarter(&self) -> u32 {
        self.model.steps_per_quarter()
    }

    fn encode(&self, sequences: &[QuantizedSequence]) -> NeuralResult<Vec<LatentVector>> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        self.model.encode(sequences)
    }

    fn decode(&self, latents: &[LatentVector]) -> NeuralResult<Vec<NoteSequence>> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.model.decode(latents)
    }
}

/// Pipeline over the default lattice model.
pub fn test_pipeline() -> MutationPipeline {
    let model = LatticeModel::new(LatticeConfig::default()).expect("default lattice config");
    MutationPipeline::builder()
        .gateway(Arc::new(model))
        .build()
        .expect("Failed to create test pipeline")
}

/// Pipeline plus a handle on its call counters.
pub fn counting_pipeline() -> (MutationPipeline, Arc<CountingGateway>) {
    let gateway = Arc::new(CountingGateway::new());
    let pipeline = MutationPipeline::builder()
        .gateway(gateway.clone())
        .build()
        .expect("Failed to create test pipeline");
    (pipeline, gateway)
}
