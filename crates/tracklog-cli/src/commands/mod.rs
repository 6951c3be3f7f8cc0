//! Command implementations.

pub mod normalize;
pub mod record;
pub mod search;
pub mod trim;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use tracklog_core::text::TextReader;
use tracklog_core::FrameSource;
use tracklog_proto::BinaryReader;

/// clap value parser for repeated `key=value` flags.
pub(crate) fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

pub(crate) fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Open a frame source over `input`, sniffing the encoding: text
/// recordings start with a UTF-8 BOM or the `FileType=` line, anything
/// else is the binary framing.
pub(crate) async fn open_frame_source(
    mut input: Box<dyn AsyncBufRead + Unpin + Send>,
) -> Result<Box<dyn FrameSource + Send>> {
    let prefix = input.fill_buf().await?;
    let is_text = prefix.starts_with(&[0xef, 0xbb, 0xbf]) || prefix.starts_with(b"File");
    if is_text {
        Ok(Box::new(TextReader::open(input).await?))
    } else {
        Ok(Box::new(BinaryReader::open(input).await?))
    }
}
