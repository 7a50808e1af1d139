//! Pretrained model artifacts on disk.
//!
//! A model directory holds `config.json` (model type and data converter
//! settings), `weights_manifest.json` (weight groups and the shard files that
//! store them) and the shards themselves. [`ModelArtifacts::open`] parses both
//! JSON files and checks that every shard is present, so a gateway built
//! from it never starts with a partial checkpoint.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "config.json";
pub const MANIFEST_FILE: &str = "weights_manifest.json";

/// Checkpoint the project was built around.
pub const DEFAULT_MODEL_NAME: &str = "mel_16bar_small_q2";

/// Local directory artifacts are fetched into.
pub const DEFAULT_MODEL_DIR: &str = "models/mel_16bar_small_q2";

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    #[serde(rename = "type")]
    pub model_type: String,
    pub data_converter: DataConverterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConverterConfig {
    #[serde(rename = "type")]
    pub converter_type: String,
    pub args: ConverterArgs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterArgs {
    pub num_steps: usize,
    #[serde(default = "default_min_pitch")]
    pub min_pitch: u8,
    #[serde(default = "default_max_pitch")]
    pub max_pitch: u8,
    #[serde(default = "default_steps_per_quarter")]
    pub steps_per_quarter: u32,
}

fn default_min_pitch() -> u8 {
    21
}

fn default_max_pitch() -> u8 {
    108
}

fn default_steps_per_quarter() -> u32 {
    4
}

/// One entry of `weights_manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGroup {
    pub paths: Vec<String>,
    #[serde(default)]
    pub weights: Vec<WeightSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSpec {
    pub name: String,
    pub shape: Vec<usize>,
    #[serde(default = "default_dtype")]
    pub dtype: String,
}

fn default_dtype() -> String {
    "float32".to_string()
}

impl WeightSpec {
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Parsed `weights_manifest.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightsManifest {
    pub groups: Vec<WeightGroup>,
}

impl WeightsManifest {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Shard file names in manifest order.
    pub fn shard_paths(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.paths.iter().map(String::as_str))
            .collect()
    }

    pub fn weight_count(&self) -> usize {
        self.groups.iter().map(|g| g.weights.len()).sum()
    }
}

/// A verified model directory.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    dir: PathBuf,
    config: ModelConfig,
    manifest: WeightsManifest,
}

impl ModelArtifacts {
    /// Parse and verify the artifacts in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        let config: ModelConfig = read_json(&dir.join(CONFIG_FILE))?;
        let manifest: WeightsManifest = read_json(&dir.join(MANIFEST_FILE))?;

        for shard in manifest.shard_paths() {
            let path = dir.join(shard);
            if !path.is_file() {
                return Err(Error::ModelUnavailable(format!(
                    "missing weight shard {}",
                    path.display()
                )));
            }
        }

        info!(
            "Loaded {} artifacts from {}: {} shards, {} weights",
            config.model_type,
            dir.display(),
            manifest.shard_paths().len(),
            manifest.weight_count()
        );

        Ok(Self {
            dir,
            config,
            manifest,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn manifest(&self) -> &WeightsManifest {
        &self.manifest
    }

    /// Every file the directory must contain, in download order.
    pub fn required_files(&self) -> Vec<String> {
        let mut files = vec![CONFIG_FILE.to_string(), MANIFEST_FILE.to_string()];
        files.extend(self.manifest.shard_paths().into_iter().map(str::to_string));
        files
    }

    /// Name of the model directory, e.g. `mel_16bar_small_q2`.
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(DEFAULT_MODEL_NAME)
            .to_string()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Reading {}", path.display());
    let data = std::fs::read(path)
        .map_err(|e| Error::ModelUnavailable(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&data)
        .map_err(|e| Error::ModelUnavailable(format!("{}: {e}", path.display())))
}
