//! Gaussian perturbation of latent vectors.
//!
//! `v' = v + n` with every `n_i` drawn independently from `N(0, sigma)`.
//! Mutation never touches its input; each call returns a new vector.

use crate::error::{Error, Result};
use crate::latent::LatentVector;
use crate::rng::create_rng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default perturbation scale.
pub const DEFAULT_SIGMA: f64 = 0.5;

/// How strongly, and how reproducibly, to perturb a latent vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    /// Standard deviation of the noise. Must be finite and non-negative.
    pub sigma: f64,
    /// Fixed seed for reproducible noise; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MutationRequest {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            seed: None,
        }
    }
}

impl MutationRequest {
    pub fn new(sigma: f64) -> Self {
        Self { sigma, seed: None }
    }

    pub fn seeded(sigma: f64, seed: u64) -> Self {
        Self {
            sigma,
            seed: Some(seed),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(Error::InvalidSigma(self.sigma));
        }
        Ok(())
    }
}

/// A perturbed vector and the L2 norm of the noise that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    pub latent: LatentVector,
    pub noise_norm: f64,
}

/// Applies [`MutationRequest`]s to latent vectors.
///
/// Stateless: the generator is built per call from the request's seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatentMutator;

impl LatentMutator {
    pub fn new() -> Self {
        Self
    }

    pub fn mutate(&self, latent: &LatentVector, request: &MutationRequest) -> Result<LatentVector> {
        request.validate()?;
        if request.sigma == 0.0 {
            return Ok(latent.clone());
        }

        let normal = normal(request.sigma)?;
        let mut rng = create_rng(request.seed);
        let perturbed = perturb(latent, &normal, &mut rng);

        debug!(
            "Mutated {}-dim latent: sigma {}, noise norm {:.4}",
            latent.dim(),
            request.sigma,
            perturbed.noise_norm
        );
        Ok(perturbed.latent)
    }

    /// Draw `count` independent perturbations of `latent` from one generator
    /// stream. Seeded requests reproduce the whole batch.
    pub fn mutate_batch(
        &self,
        latent: &LatentVector,
        request: &MutationRequest,
        count: usize,
    ) -> Result<Vec<Perturbation>> {
        request.validate()?;
        if request.sigma == 0.0 {
            return Ok(vec![
                Perturbation {
                    latent: latent.clone(),
                    noise_norm: 0.0,
                };
                count
            ]);
        }

        let normal = normal(request.sigma)?;
        let mut rng = create_rng(request.seed);
        let batch: Vec<_> = (0..count)
            .map(|_| perturb(latent, &normal, &mut rng))
            .collect();

        debug!(
            "Mutated {}-dim latent into {} candidates: sigma {}",
            latent.dim(),
            count,
            request.sigma
        );
        Ok(batch)
    }
}

/// Mutate with a default [`LatentMutator`].
pub fn mutate(latent: &LatentVector, request: &MutationRequest) -> Result<LatentVector> {
    LatentMutator.mutate(latent, request)
}

fn normal(sigma: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, sigma).map_err(|_| Error::InvalidSigma(sigma))
}

fn perturb(latent: &LatentVector, normal: &Normal<f64>, rng: &mut impl Rng) -> Perturbation {
    let mut sum_sq = 0.0;
    let values = latent
        .iter()
        .map(|&x| {
            let n = normal.sample(rng);
            sum_sq += n * n;
            (x as f64 + n) as f32
        })
        .collect();

    Perturbation {
        latent: LatentVector::new(values),
        noise_norm: sum_sq.sqrt(),
    }
}
