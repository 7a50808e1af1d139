//! `vario.toml` settings for the mutate command.
//!
//! ```toml
//! model_dir = "models/mel_16bar_small_q2"
//! output = "mutation.mid"
//! steps_per_quarter = 4
//! sigma = 0.5
//! seed = 42
//! candidates = 8
//! keep = 3
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use vario::neural::{DEFAULT_MODEL_DIR, DEFAULT_SIGMA};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MutateConfig {
    pub model_dir: PathBuf,
    pub output: PathBuf,
    pub steps_per_quarter: u32,
    pub qpm: f64,
    pub sigma: f64,
    pub seed: Option<u64>,
    pub candidates: usize,
    pub keep: usize,
}

impl Default for MutateConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            output: PathBuf::from("mutation.mid"),
            steps_per_quarter: 4,
            qpm: vario::midi::DEFAULT_QPM,
            sigma: DEFAULT_SIGMA,
            seed: None,
            candidates: 1,
            keep: 1,
        }
    }
}

impl MutateConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
