//! Latent vectors.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Fixed-length encoding of one phrase. The length is the model's latent
/// dimensionality and is never chosen by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LatentVector(Vec<f32>);

impl LatentVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.0.iter()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&x| (x as f64) * (x as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// Euclidean distance, or `None` when dimensions differ.
    pub fn distance(&self, other: &LatentVector) -> Option<f64> {
        if self.dim() != other.dim() {
            return None;
        }
        let sum: f64 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(&a, &b)| {
                let d = a as f64 - b as f64;
                d * d
            })
            .sum();
        Some(sum.sqrt())
    }
}

impl From<Vec<f32>> for LatentVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl Index<usize> for LatentVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}
