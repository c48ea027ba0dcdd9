// Trains the addiction classifier from the survey CSV and persists the
// vectorizer, scaler and classifier as one consistent artifact set.
//
// Usage:
//   train                                  # paths from engine.toml / SMA_* env
//   train --data survey.csv --out ./model  # explicit paths
//   train --json                           # machine-readable report

use anyhow::Context;
use clap::Parser;
use smaddiction_engine::{config::Config, storage::ArtifactStore, telemetry, training};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "train")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Survey CSV to train on (overrides training.data_path)
    #[arg(short, long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Directory the artifact set is written to (overrides artifacts.dir)
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Seed for both dataset splits (overrides training.seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the training report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    telemetry::init();
    let cli = Cli::parse();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Training failed: {:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(data) = cli.data {
        config.training.data_path = data;
    }
    if let Some(out) = cli.out {
        config.artifacts.dir = out;
    }
    if let Some(seed) = cli.seed {
        config.training.seed = seed;
    }

    let store = ArtifactStore::new(&config.artifacts.dir);
    let outcome = training::run(&config.training, &store).with_context(|| {
        format!(
            "training on {} failed",
            config.training.data_path.display()
        )
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        print!("{}", outcome.report);
        println!("\nArtifacts (run {}):", outcome.report.run.run_id);
        let manifest = store.load_manifest()?;
        for entry in &manifest.artifacts {
            println!("  {}", store.dir().join(&entry.file).display());
        }
    }
    Ok(())
}
