use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use map::MapConfig;
use tools::{Replay, Script};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drives the map view coordinator from scripted events")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON event script and print the map state after each event
    Replay {
        /// Script with datasets and events
        script: PathBuf,

        /// Map config JSON (built-in defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    match args.command {
        Command::Replay { script, config } => cmd_replay(&script, config.as_deref()),
    }
}

fn cmd_replay(script_path: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let config = match config_path {
        Some(p) => MapConfig::load(p).map_err(|e| format!("{}: {e}", p.display()))?,
        None => MapConfig::default(),
    };
    let script =
        Script::load(script_path).map_err(|e| format!("{}: {e}", script_path.display()))?;
    info!(
        datasets = script.datasets.len(),
        events = script.events.len(),
        "replaying {}",
        script_path.display()
    );

    let mut replay = Replay::new(&script, config).map_err(|e| e.to_string())?;
    let lines = replay.run(&script.events).map_err(|e| e.to_string())?;

    let mut out = std::io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}").map_err(|e| format!("write stdout: {e}"))?;
    }
    Ok(())
}
