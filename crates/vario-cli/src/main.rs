//! `vario` command-line tool: fetch a checkpoint, mutate a phrase to MIDI.

mod config;
mod notes;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::MutateConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vario::neural::{
    fetch_model, ArtifactSource, DirectorySource, FetchStatus, HttpSource, CHECKPOINT_URL,
    DEFAULT_MODEL_DIR,
};
use vario::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "vario", version, about = "Melodic variations through a latent sequence model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download checkpoint files into the model directory
    Fetch(FetchArgs),
    /// Mutate a phrase and write the result as a MIDI file
    Mutate(MutateArgs),
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Copy from a local directory laid out like the published checkpoint
    #[arg(long, conflicts_with = "url")]
    from: Option<PathBuf>,

    /// Base URL of the checkpoint
    #[arg(long, default_value = CHECKPOINT_URL)]
    url: String,

    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,
}

#[derive(Debug, Args)]
struct MutateArgs {
    /// TOML file with defaults for the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the phrase from a Standard MIDI File
    #[arg(long, conflicts_with = "notes")]
    input: Option<PathBuf>,

    /// Phrase as pitch:start:end triples, e.g. 60:0:1,62:1:2
    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Use the built-in reference model instead of a checkpoint directory
    #[arg(long, conflicts_with = "model_dir")]
    builtin: bool,

    #[arg(long)]
    sigma: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    steps_per_quarter: Option<u32>,

    /// Number of mutations to sample
    #[arg(long)]
    candidates: Option<usize>,

    /// Number of samples to write, closest to the input first
    #[arg(long)]
    keep: Option<usize>,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl MutateArgs {
    fn resolve(&self) -> Result<MutateConfig> {
        let mut config = match &self.config {
            Some(path) => MutateConfig::load(path)?,
            None => MutateConfig::default(),
        };
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(sigma) = self.sigma {
            config.sigma = sigma;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(spq) = self.steps_per_quarter {
            config.steps_per_quarter = spq;
        }
        if let Some(candidates) = self.candidates {
            config.candidates = candidates;
        }
        if let Some(keep) = self.keep {
            config.keep = keep;
        }
        Ok(config)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Fetch(args) => fetch(&args),
        Command::Mutate(args) => mutate(&args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn fetch(args: &FetchArgs) -> Result<()> {
    let source: Box<dyn ArtifactSource> = match &args.from {
        Some(dir) => Box::new(DirectorySource::new(dir)),
        None => Box::new(HttpSource::new(&args.url)),
    };
    let report = fetch_model(source.as_ref(), &args.model_dir)?;

    for (name, status) in &report.files {
        match status {
            FetchStatus::Fetched { bytes } => println!("Fetched {name} ({bytes} bytes)"),
            FetchStatus::Failed { reason } => println!("Failed {name}: {reason}"),
        }
    }

    if !report.is_complete() {
        bail!("checkpoint in {} is incomplete", report.dest.display());
    }
    Ok(())
}

fn mutate(args: &MutateArgs) -> Result<()> {
    let config = args.resolve()?;

    let model = if args.builtin {
        LatticeModel::new(LatticeConfig {
            steps_per_quarter: config.steps_per_quarter,
            ..LatticeConfig::default()
        })?
    } else {
        let artifacts = ModelArtifacts::open(&config.model_dir).with_context(|| {
            format!(
                "loading {} (run `vario fetch` first, or pass --builtin)",
                config.model_dir.display()
            )
        })?;
        LatticeModel::from_artifacts(&artifacts)?
    };

    let pipeline = MutationPipeline::builder()
        .gateway(Arc::new(model))
        .qpm(config.qpm)
        .build()?;

    let phrase = load_phrase(args, &config)?;
    let mut request = MutationRequest::new(config.sigma);
    request.seed = config.seed;

    if config.candidates <= 1 {
        let variant = pipeline.run_sequence(&phrase, config.steps_per_quarter, &request)?;
        vario::write_midi(&variant, &config.output)?;
        println!("Wrote {}", config.output.display());
        return Ok(());
    }

    let variations = pipeline.variations_of(
        &phrase,
        config.steps_per_quarter,
        &request,
        config.candidates,
        config.keep,
    )?;
    for (i, variation) in variations.iter().enumerate() {
        let path = numbered(&config.output, i + 1);
        vario::write_midi(&variation.sequence, &path)?;
        println!(
            "Wrote {} (distance {:.3})",
            path.display(),
            variation.latent_distance
        );
    }
    Ok(())
}

fn load_phrase(args: &MutateArgs, config: &MutateConfig) -> Result<NoteSequence> {
    if let Some(path) = &args.input {
        return vario::read_midi(path).with_context(|| format!("reading {}", path.display()));
    }

    let events = match &args.notes {
        Some(list) => notes::parse_notes(list)?,
        None => notes::DEFAULT_PHRASE.to_vec(),
    };
    Ok(SequenceBuilder::new()
        .qpm(config.qpm)
        .events(&events)
        .build()?)
}

/// `mutation.mid` -> `mutation-2.mid`
fn numbered(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mutation".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n}"),
    };
    path.with_file_name(name)
}
