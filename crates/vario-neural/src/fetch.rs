//! Model artifact retrieval.
//!
//! Copies a fixed, named set of checkpoint files from an [`ArtifactSource`]
//! into a local model directory. Each file is fetched independently: a
//! failure is recorded in the [`FetchReport`] and the remaining files are
//! still attempted. There is no resume and no checksum verification; run
//! [`ModelArtifacts::open`](crate::ModelArtifacts::open) afterwards to check
//! the directory is complete.

use crate::artifacts::{WeightsManifest, CONFIG_FILE, MANIFEST_FILE};
use crate::error::Result;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Somewhere checkpoint files can be read from by name.
pub trait ArtifactSource {
    /// e.g. a directory path or base URL, for logs
    fn describe(&self) -> String;

    fn fetch(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// A local mirror directory laid out like the remote checkpoint.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(name))
    }
}

/// Published location of the default melody checkpoint.
pub const CHECKPOINT_URL: &str =
    "https://storage.googleapis.com/magentadata/js/checkpoints/music_vae/mel_16bar_small_q2";

/// Checkpoint files served over HTTP(S) under a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(CHECKPOINT_URL)
    }
}

impl ArtifactSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn fetch(&self, name: &str) -> io::Result<Vec<u8>> {
        let url = self.url_for(name);
        let response = ureq::get(&url)
            .call()
            .map_err(|e| io::Error::other(format!("{url}: {e}")))?;

        let mut data = Vec::new();
        response.into_reader().read_to_end(&mut data)?;
        Ok(data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Fetched { bytes: u64 },
    Failed { reason: String },
}

/// Per-file outcome of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub dest: PathBuf,
    pub files: Vec<(String, FetchStatus)>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.files
            .iter()
            .all(|(_, status)| matches!(status, FetchStatus::Fetched { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().filter_map(|(name, status)| match status {
            FetchStatus::Failed { reason } => Some((name.as_str(), reason.as_str())),
            FetchStatus::Fetched { .. } => None,
        })
    }

    fn status_of(&self, name: &str) -> Option<&FetchStatus> {
        self.files.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

/// Fetch `files` from `source` into `dest`, creating `dest` as needed.
///
/// Only fails as a whole when `dest` cannot be created.
pub fn fetch_files(
    source: &dyn ArtifactSource,
    dest: impl AsRef<Path>,
    files: &[&str],
) -> Result<FetchReport> {
    let dest = dest.as_ref().to_path_buf();
    std::fs::create_dir_all(&dest)?;

    let files = files
        .iter()
        .map(|&name| {
            let status = fetch_one(source, &dest, name);
            (name.to_string(), status)
        })
        .collect();

    Ok(FetchReport { dest, files })
}

/// Fetch a whole checkpoint: config and manifest first, then every shard the
/// manifest names.
pub fn fetch_model(source: &dyn ArtifactSource, dest: impl AsRef<Path>) -> Result<FetchReport> {
    let dest = dest.as_ref();
    info!("Fetching model from {} into {}", source.describe(), dest.display());

    let mut report = fetch_files(source, dest, &[CONFIG_FILE, MANIFEST_FILE])?;
    if !matches!(report.status_of(MANIFEST_FILE), Some(FetchStatus::Fetched { .. })) {
        return Ok(report);
    }

    let manifest = match std::fs::read(dest.join(MANIFEST_FILE))
        .map_err(crate::Error::from)
        .and_then(|data| WeightsManifest::from_json(&data))
    {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!("Unreadable {}: {}", MANIFEST_FILE, e);
            if let Some((_, status)) = report.files.iter_mut().find(|(n, _)| n == MANIFEST_FILE) {
                *status = FetchStatus::Failed {
                    reason: format!("unreadable manifest: {e}"),
                };
            }
            return Ok(report);
        }
    };

    let shards = manifest.shard_paths();
    let shard_report = fetch_files(source, dest, &shards)?;
    report.files.extend(shard_report.files);
    Ok(report)
}

fn fetch_one(source: &dyn ArtifactSource, dest: &Path, name: &str) -> FetchStatus {
    // Names come from a downloaded manifest; keep them inside dest
    if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
        warn!("Refusing to fetch {:?}: not a plain file name", name);
        return FetchStatus::Failed {
            reason: "not a plain file name".to_string(),
        };
    }

    let result = source
        .fetch(name)
        .and_then(|data| std::fs::write(dest.join(name), &data).map(|_| data.len() as u64));

    match result {
        Ok(bytes) => {
            info!("Fetched {} ({} bytes)", name, bytes);
            FetchStatus::Fetched { bytes }
        }
        Err(e) => {
            warn!("Failed to fetch {} from {}: {}", name, source.describe(), e);
            FetchStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}
