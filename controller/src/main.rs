//! gesture-replay: feed recorded landmark messages through the gesture engine.
//!
//! Reads one s-expression message per line and writes responses and
//! `:gesture-confirmed` events to stdout, one per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gesture_controller::ipc::handle_message;
use gesture_controller::{EngineConfig, GestureEngine};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gesture-replay", about = "Replay hand-landmark frames through the gesture engine")]
struct Cli {
    /// Message file, or "-" for stdin
    #[arg(long, default_value = "-")]
    input: String,

    /// Engine config plist
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only print events and errors
    #[arg(long)]
    quiet: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("gesture-replay {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_controller=info".into()),
        )
        .init();

    info!("gesture-replay v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let mut engine = GestureEngine::new(config);

    let reader: Box<dyn BufRead> = if cli.input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&cli.input).with_context(|| format!("opening {}", cli.input))?;
        Box::new(BufReader::new(file))
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut messages = 0u64;
    for line in reader.lines() {
        let line = line.context("reading input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        messages += 1;
        for reply in handle_message(&mut engine, line) {
            if cli.quiet && reply.contains(":status :ok") {
                continue;
            }
            writeln!(out, "{}", reply)?;
        }
    }
    out.flush()?;

    info!("Replayed {} messages", messages);
    eprintln!("frame timing {}", engine.timing().stats_sexp());
    Ok(())
}
