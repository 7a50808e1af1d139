//! Per-call random number generators.
//!
//! All latent noise flows through this module. Generators are built fresh for
//! every mutation and never shared between runs, so concurrent pipelines stay
//! independent and a seeded request is reproducible.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 generator: deterministic for `Some(seed)`, seeded from OS
/// entropy otherwise.
pub fn create_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_entropy(),
    }
}
