// Function-handler shell: reads one invocation event (JSON) from stdin or
// --event and writes the response envelope (JSON) to stdout.
//
//   echo '{"body": "{\"age\": 21}"}' | handler
//   handler --event event.json --artifacts ./model

use anyhow::Context;
use clap::Parser;
use smaddiction_engine::{config::Config, handler, telemetry};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "handler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read the event from a file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    event: Option<PathBuf>,

    /// Artifact directory (overrides artifacts.dir)
    #[arg(short, long, value_name = "DIR")]
    artifacts: Option<PathBuf>,
}

fn main() -> ExitCode {
    telemetry::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // startup failure: no envelope is emitted
            error!("Handler startup failed: {:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(dir) = cli.artifacts {
        config.artifacts.dir = dir;
    }

    let event = cli.event;
    let read_event = move || -> anyhow::Result<String> {
        match event {
            Some(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read event {}", path.display())),
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read event from stdin")?;
                Ok(buf)
            }
        }
    };

    let stdout = std::io::stdout();
    handler::invoke(&config.artifacts.dir, read_event, &mut stdout.lock())
}
