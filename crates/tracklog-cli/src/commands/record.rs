//! `tracklog record`: record a realtime telemetry stream to a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::info;

use tracklog_core::text::TextWriter;
use tracklog_core::{FrameSink, FrameSource, Header};
use tracklog_proto::BinaryWriter;

use crate::container;

#[derive(Args)]
pub struct RecordArgs {
    /// Connection string of the realtime server (host or host:port)
    #[arg(long, value_name = "HOST[:PORT]")]
    pub server: String,

    /// Path to the output ACMI file
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Username presented during the handshake
    #[arg(long, default_value = "tracklog-record")]
    pub username: String,

    /// Record using the binary frame encoding
    #[arg(long = "binary-format")]
    pub binary_format: bool,
}

pub async fn run(args: RecordArgs) -> Result<()> {
    let mut reader = tracklog_client::connect(&args.server, &args.username, "").await?;
    let header = reader.header().clone();

    info!("recording from {} to {}", args.server, args.output.display());

    if container::is_zip_path(&args.output) {
        let mut buffer = Vec::new();
        record_into(&mut reader, &mut buffer, &header, args.binary_format).await?;
        container::write_zip_acmi(&args.output, &buffer)?;
    } else {
        let file = tokio::fs::File::create(&args.output)
            .await
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        record_into(&mut reader, file, &header, args.binary_format).await?;
    }

    Ok(())
}

async fn record_into<W>(
    reader: &mut (dyn FrameSource + Send),
    sink: W,
    header: &Header,
    binary_format: bool,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut writer: Box<dyn FrameSink + Send + '_> = if binary_format {
        Box::new(BinaryWriter::create(sink, header).await?)
    } else {
        Box::new(TextWriter::create(sink, header).await?)
    };

    // Realtime frames arrive in order; keep them that way on disk.
    let (tx, mut rx) = mpsc::channel(1);
    let consumer = async {
        while let Some(frame) = rx.recv().await {
            writer.write_frame(&frame).await?;
        }
        writer.shutdown().await
    };
    let (process_result, write_result) = tokio::join!(reader.process_frames(1, tx), consumer);
    process_result?;
    write_result?;
    Ok(())
}
