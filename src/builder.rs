//! Builder for configuring and constructing a `MutationPipeline`.

use crate::pipeline::{MutationPipeline, PipelineInner};
use crate::{Error, Result};
use std::sync::Arc;
use vario_midi::{DEFAULT_QPM, DEFAULT_TICKS_PER_QUARTER, MAX_TICKS_PER_QUARTER};
use vario_neural::{LatentMutator, ModelGateway};

/// A gateway is required; everything else has defaults (220 ticks per
/// quarter, 120 qpm).
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use vario::prelude::*;
///
/// let artifacts = ModelArtifacts::open("models/mel_16bar_small_q2")?;
/// let pipeline = MutationPipeline::builder()
///     .gateway(Arc::new(LatticeModel::from_artifacts(&artifacts)?))
///     .build()?;
/// ```
pub struct MutationPipelineBuilder {
    gateway: Option<Arc<dyn ModelGateway>>,
    ticks_per_quarter: u32,
    qpm: f64,
}

impl Default for MutationPipelineBuilder {
    fn default() -> Self {
        Self {
            gateway: None,
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            qpm: DEFAULT_QPM,
        }
    }
}

impl MutationPipelineBuilder {
    /// The loaded model. Shared read-only by every run.
    pub fn gateway(mut self, gateway: Arc<dyn ModelGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Tick resolution given to sequences built from raw events. Default: 220
    pub fn ticks_per_quarter(mut self, ticks: u32) -> Self {
        self.ticks_per_quarter = ticks;
        self
    }

    /// Tempo given to sequences built from raw events. Default: 120.0
    pub fn qpm(mut self, qpm: f64) -> Self {
        self.qpm = qpm;
        self
    }

    pub fn build(self) -> Result<MutationPipeline> {
        let gateway = self.gateway.ok_or_else(|| {
            Error::InvalidConfig(
                "No model gateway configured. Use .gateway() to set one.".to_string(),
            )
        })?;
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > MAX_TICKS_PER_QUARTER {
            return Err(Error::InvalidConfig(format!(
                "ticks per quarter {} outside 1..={MAX_TICKS_PER_QUARTER}",
                self.ticks_per_quarter
            )));
        }
        if !self.qpm.is_finite() || self.qpm <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tempo {} qpm is not positive",
                self.qpm
            )));
        }

        tracing::debug!(
            "Pipeline ready: gateway {}, {}-dim latents, {} steps/quarter",
            gateway.name(),
            gateway.latent_dim(),
            gateway.steps_per_quarter()
        );

        Ok(MutationPipeline {
            inner: Arc::new(PipelineInner {
                gateway,
                mutator: LatentMutator::new(),
                ticks_per_quarter: self.ticks_per_quarter,
                qpm: self.qpm,
            }),
        })
    }
}
