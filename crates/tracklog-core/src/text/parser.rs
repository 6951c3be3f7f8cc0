//! Incremental reader for the ACMI text format.
//!
//! The format is line oriented. The header region holds `FileType=` and
//! `FileVersion=` lines followed by the initial time frame's object lines
//! (no offset prefix). Every subsequent frame starts with `#<offset>` and
//! runs until the next `#` line or EOF. An object line ending in `\`
//! continues on the next physical line, the backslash standing for a
//! literal newline in the property value.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::frame::{RawTimeFrame, TimeFrame};
use crate::header::Header;
use crate::object::Object;
use crate::property::split_property_tokens;
use crate::text::pipeline;
use crate::traits::{FrameSource, RawFrameSource};

const BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Reader for a text ACMI byte stream.
///
/// Opening the reader consumes the header region; the remaining frames are
/// drained either through the parallel pipeline ([`FrameSource`]) or one
/// raw frame at a time ([`RawFrameSource`]).
pub struct TextReader<R> {
    header: Header,
    lines: LineReader<R>,
}

impl<R: AsyncBufRead + Unpin + Send> TextReader<R> {
    pub async fn open(reader: R) -> Result<Self> {
        let mut lines = LineReader::new(reader);
        lines.strip_bom().await?;
        let header = read_header(&mut lines).await?;
        Ok(Self { header, lines })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for TextReader<R> {
    fn header(&self) -> &Header {
        &self.header
    }

    async fn process_frames(
        &mut self,
        concurrency: usize,
        out: mpsc::Sender<TimeFrame>,
    ) -> Result<()> {
        pipeline::process_frames(&mut self.lines, concurrency, out).await
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> RawFrameSource for TextReader<R> {
    fn header(&self) -> &Header {
        &self.header
    }

    async fn read_raw_frame(&mut self) -> Result<Option<RawTimeFrame>> {
        let Some(prefix) = self.lines.peek_byte().await? else {
            return Ok(None);
        };
        if prefix != b'#' {
            return Err(Error::FrameParse(
                "expected a time frame offset line".into(),
            ));
        }
        let Some(line) = self.lines.read_line().await? else {
            return Ok(None);
        };
        let mut frame = RawTimeFrame::new(parse_offset_line(&line)?);
        loop {
            match self.lines.peek_byte().await? {
                None | Some(b'#') => break,
                Some(_) => {}
            }
            frame.lines.push(read_logical_line(&mut self.lines).await?);
        }
        Ok(Some(frame))
    }
}

/// Buffered line access over an async byte stream.
pub(crate) struct LineReader<R> {
    inner: R,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consume a UTF-8 byte order mark if the stream starts with one.
    async fn strip_bom(&mut self) -> Result<()> {
        if self.peek_byte().await? == Some(BOM[0]) {
            let mut prefix = [0u8; 3];
            self.inner.read_exact(&mut prefix).await?;
            if prefix != BOM {
                return Err(Error::HeaderParse("malformed byte order mark".into()));
            }
        }
        Ok(())
    }

    pub(crate) async fn peek_byte(&mut self) -> Result<Option<u8>> {
        let buffered = self.inner.fill_buf().await?;
        Ok(buffered.first().copied())
    }

    /// Read one physical line including its trailing newline. `None` at EOF.
    pub(crate) async fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let read = self.inner.read_until(b'\n', &mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

async fn read_header<R>(lines: &mut LineReader<R>) -> Result<Header>
where
    R: AsyncBufRead + Unpin,
{
    let mut file_type = None;
    let mut file_version = None;

    loop {
        match lines.peek_byte().await? {
            // A leading digit is the first object line of the initial frame.
            Some(prefix) if prefix.is_ascii_digit() => break,
            Some(_) => {}
            None => {
                return Err(Error::HeaderParse(
                    "unexpected end of file in header".into(),
                ));
            }
        }
        let Some(line) = lines.read_line().await? else {
            return Err(Error::HeaderParse(
                "unexpected end of file in header".into(),
            ));
        };
        let line = trim_line_ending(&line);
        let text = std::str::from_utf8(line)
            .map_err(|_| Error::HeaderParse("header line is not valid UTF-8".into()))?;
        if let Some(value) = text.strip_prefix("FileType=") {
            file_type = Some(value.to_string());
        } else if let Some(value) = text.strip_prefix("FileVersion=") {
            file_version = Some(value.to_string());
        } else {
            return Err(Error::HeaderParse(format!(
                "unexpected header line: `{text}`"
            )));
        }
    }

    let file_type = file_type.ok_or_else(|| Error::HeaderParse("missing FileType".into()))?;
    let file_version =
        file_version.ok_or_else(|| Error::HeaderParse("missing FileVersion".into()))?;

    let initial_time_frame = read_frame_body(lines, 0.0).await?;
    Header::from_initial_frame(file_type, file_version, initial_time_frame)
}

/// Read object lines until the next `#` line or EOF. EOF is a valid
/// terminator here so a file without subsequent frames still parses.
async fn read_frame_body<R>(lines: &mut LineReader<R>, offset: f64) -> Result<TimeFrame>
where
    R: AsyncBufRead + Unpin,
{
    let mut frame = TimeFrame::new(offset);
    let mut index = HashMap::new();
    loop {
        match lines.peek_byte().await? {
            None | Some(b'#') => break,
            Some(_) => {}
        }
        let line = read_logical_line(lines).await?;
        parse_object_line(&line, &mut frame, &mut index)?;
    }
    Ok(frame)
}

/// Assemble one logical object line, keeping `\` + newline continuations
/// in their wire form. EOF inside a continuation is an error.
async fn read_logical_line<R>(lines: &mut LineReader<R>) -> Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut logical = Vec::new();
    loop {
        let Some(line) = lines.read_line().await? else {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "end of file inside a continued object line",
            )));
        };
        let line = trim_line_ending(&line);
        logical.extend_from_slice(line);
        if line.ends_with(b"\\") {
            logical.push(b'\n');
            continue;
        }
        return Ok(logical);
    }
}

/// Parse one complete frame buffer (offset line plus body) as dispatched
/// by the pipeline producer. Pure; runs on the worker tasks.
pub(crate) fn parse_frame_buffer(data: &[u8]) -> Result<TimeFrame> {
    let mut physical = data.split_inclusive(|&b| b == b'\n');
    let Some(first) = physical.next() else {
        return Err(Error::FrameParse("empty time frame buffer".into()));
    };

    let mut frame = TimeFrame::new(parse_offset_line(first)?);
    let mut index = HashMap::new();
    let mut logical: Vec<u8> = Vec::new();

    for line in physical {
        let line = trim_line_ending(line);
        logical.extend_from_slice(line);
        if line.ends_with(b"\\") {
            logical.push(b'\n');
            continue;
        }
        parse_object_line(&logical, &mut frame, &mut index)?;
        logical.clear();
    }

    if !logical.is_empty() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "time frame ends inside a continued object line",
        )));
    }

    Ok(frame)
}

/// Parse a single object line into `frame`, merging repeated ids through
/// the per-frame `index` (id → position in the frame's object list).
pub(crate) fn parse_object_line(
    line: &[u8],
    frame: &mut TimeFrame,
    index: &mut HashMap<u64, usize>,
) -> Result<()> {
    let text = std::str::from_utf8(line)
        .map_err(|_| Error::FrameParse("object line is not valid UTF-8".into()))?;
    if text.is_empty() {
        return Err(Error::FrameParse("empty object line".into()));
    }

    if let Some(id_hex) = text.strip_prefix('-') {
        let id = parse_object_id(id_hex)?;
        match index.get(&id) {
            Some(&slot) => frame.objects[slot].deleted = true,
            None => {
                frame.objects.push(Object::deletion(id));
                index.insert(id, frame.objects.len() - 1);
            }
        }
        return Ok(());
    }

    let (id_hex, property_list) = match text.split_once(',') {
        Some((id_hex, rest)) => (id_hex, rest),
        None => (text, ""),
    };
    let id = parse_object_id(id_hex)?;

    let slot = match index.get(&id) {
        Some(&slot) => slot,
        None => {
            frame.objects.push(Object::new(id));
            index.insert(id, frame.objects.len() - 1);
            frame.objects.len() - 1
        }
    };
    let object = &mut frame.objects[slot];

    for token in split_property_tokens(property_list)? {
        if token.is_empty() {
            continue;
        }
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| Error::FrameParse(format!("failed to parse property `{token}`")))?;
        object.set(key, value);
    }

    Ok(())
}

fn parse_object_id(id_hex: &str) -> Result<u64> {
    u64::from_str_radix(id_hex, 16)
        .map_err(|_| Error::FrameParse(format!("invalid object id `{id_hex}`")))
}

pub(crate) fn parse_offset_line(line: &[u8]) -> Result<f64> {
    let line = trim_line_ending(line);
    let text = std::str::from_utf8(line)
        .map_err(|_| Error::FrameParse("offset line is not valid UTF-8".into()))?;
    let value = text.strip_prefix('#').ok_or_else(|| {
        Error::FrameParse(format!("expected time frame offset, found `{text}`"))
    })?;
    value
        .parse()
        .map_err(|_| Error::FrameParse(format!("invalid time frame offset `{value}`")))
}

/// Strip a trailing LF, tolerating CRLF input.
fn trim_line_ending(mut line: &[u8]) -> &[u8] {
    if let Some(stripped) = line.strip_suffix(b"\n") {
        line = stripped;
    }
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }
    line
}
