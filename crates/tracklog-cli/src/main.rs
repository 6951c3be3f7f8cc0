//! Command-line toolset for ACMI flight recordings.
//!
//! ```bash
//! # Find a pilot across one or more recordings
//! tracklog search --file sortie.txt.acmi --property Pilot=Alpha --print-properties
//!
//! # Cut a recording down to a time window
//! tracklog trim --input long.txt.acmi --output short.txt.acmi \
//!     --start-at-offset-time 600 --end-at-offset-time 1200
//!
//! # Rewrite a recording without chaff and flares
//! tracklog normalize --input raw.zip.acmi --output clean.zip.acmi \
//!     --exclude-property Type=Misc+Chaff --exclude-property Type=Misc+Flare
//!
//! # Record from a realtime server
//! tracklog record --server fight.example.net --output sortie.txt.acmi
//! ```

mod commands;
mod container;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{normalize, record, search, trim};

#[derive(Parser)]
#[command(name = "tracklog", version, about = "Inspect and transform ACMI flight recordings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find objects matching a set of property pairs
    Search(search::SearchArgs),
    /// Reduce a recording's duration to a time window
    Trim(trim::TrimArgs),
    /// Rewrite a recording, optionally excluding objects by property
    Normalize(normalize::NormalizeArgs),
    /// Record a realtime telemetry stream to a file
    Record(record::RecordArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match Cli::parse().command {
        Commands::Search(args) => search::run(args).await,
        Commands::Trim(args) => trim::run(args).await,
        Commands::Normalize(args) => normalize::run(args).await,
        Commands::Record(args) => record::run(args).await,
    }
}
