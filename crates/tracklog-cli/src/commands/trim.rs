//! `tracklog trim`: reduce a recording to a time window.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use tokio::io::AsyncWrite;
use tracing::info;

use tracklog_core::header::parse_reference_time;
use tracklog_core::text::{RawTextWriter, TextReader};
use tracklog_core::{ops, RawFrameSource};

use crate::commands::default_concurrency;
use crate::container;

#[derive(Args)]
pub struct TrimArgs {
    /// Path to the input ACMI file
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the output ACMI file
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Start of the window, as an offset in seconds
    #[arg(long = "start-at-offset-time", value_name = "SECONDS", conflicts_with = "start_at_time")]
    pub start_at_offset_time: Option<f64>,

    /// End of the window, as an offset in seconds
    #[arg(long = "end-at-offset-time", value_name = "SECONDS", conflicts_with = "end_at_time")]
    pub end_at_offset_time: Option<f64>,

    /// Start of the window, as a YYYY-MM-DDTHH:MM:SSZ timestamp
    #[arg(long = "start-at-time", value_name = "TIME")]
    pub start_at_time: Option<String>,

    /// End of the window, as a YYYY-MM-DDTHH:MM:SSZ timestamp
    #[arg(long = "end-at-time", value_name = "TIME")]
    pub end_at_time: Option<String>,

    /// Number of parallel processing workers
    #[arg(long, value_name = "N", default_value_t = default_concurrency())]
    pub concurrency: usize,
}

pub async fn run(args: TrimArgs) -> Result<()> {
    let input = container::open_input(&args.input).await?;
    let mut reader = TextReader::open(input)
        .await
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let reference_time = reader.header().reference_time;

    let start = resolve_bound(
        args.start_at_offset_time,
        args.start_at_time.as_deref(),
        reference_time,
        0.0,
    )?;
    let end = resolve_bound(
        args.end_at_offset_time,
        args.end_at_time.as_deref(),
        reference_time,
        f64::INFINITY,
    )?;
    info!("trimming {} to offsets {start}..{end}", args.input.display());

    if container::is_zip_path(&args.output) {
        let mut buffer = Vec::new();
        run_trim(&mut reader, &mut buffer, start, end).await?;
        container::write_zip_acmi(&args.output, &buffer)?;
    } else {
        let file = tokio::fs::File::create(&args.output)
            .await
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        run_trim(&mut reader, file, start, end).await?;
    }

    Ok(())
}

async fn run_trim<W>(
    reader: &mut (dyn RawFrameSource + Send),
    sink: W,
    start: f64,
    end: f64,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut writer = RawTextWriter::new(sink);
    ops::trim(reader, &mut writer, start, end).await?;
    Ok(())
}

/// Resolve a window bound from its offset or wall-clock flag; clap
/// rejects the two being combined.
fn resolve_bound(
    offset: Option<f64>,
    time: Option<&str>,
    reference_time: DateTime<Utc>,
    default: f64,
) -> Result<f64> {
    match (offset, time) {
        (Some(offset), _) => Ok(offset),
        (None, Some(time)) => {
            let time = parse_reference_time(time)?;
            Ok((time - reference_time).num_milliseconds() as f64 / 1000.0)
        }
        (None, None) => Ok(default),
    }
}
