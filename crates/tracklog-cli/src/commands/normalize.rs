//! `tracklog normalize`: rewrite a recording, optionally excluding
//! objects by property.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncWrite;
use tracing::info;

use tracklog_core::text::TextWriter;
use tracklog_core::{ops, FrameSource};

use crate::commands::{default_concurrency, open_frame_source, parse_key_value};
use crate::container;

#[derive(Args)]
pub struct NormalizeArgs {
    /// Path to the input ACMI file
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the output ACMI file
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// key=value pair whose carriers are excluded from the output
    /// (repeatable)
    #[arg(long = "exclude-property", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub exclude_properties: Vec<(String, String)>,

    /// Number of parallel parsing workers; set to 1 to stream with
    /// minimal memory instead of collecting and re-sorting
    #[arg(long, value_name = "N", default_value_t = default_concurrency())]
    pub concurrency: usize,
}

pub async fn run(args: NormalizeArgs) -> Result<()> {
    let exclusions: HashMap<String, String> = args.exclude_properties.iter().cloned().collect();

    let input = container::open_input(&args.input).await?;
    let mut reader = open_frame_source(input).await?;

    info!("normalizing {}", args.input.display());

    if container::is_zip_path(&args.output) {
        let mut buffer = Vec::new();
        run_normalize(&mut *reader, &mut buffer, &exclusions, args.concurrency).await?;
        container::write_zip_acmi(&args.output, &buffer)?;
    } else {
        let file = tokio::fs::File::create(&args.output)
            .await
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        run_normalize(&mut *reader, file, &exclusions, args.concurrency).await?;
    }

    Ok(())
}

async fn run_normalize<W>(
    reader: &mut (dyn FrameSource + Send),
    sink: W,
    exclusions: &HashMap<String, String>,
    concurrency: usize,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let header = reader.header().clone();
    let mut writer = TextWriter::create(sink, &header).await?;
    ops::normalize(reader, &mut writer, exclusions, concurrency).await?;
    Ok(())
}
