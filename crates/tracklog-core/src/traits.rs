//! Reader/writer capability traits.
//!
//! Each encoding (text, binary, realtime) provides concrete
//! implementations; operations are written against these traits so they
//! compose with any of them.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::frame::{RawTimeFrame, TimeFrame};
use crate::header::Header;

/// A source of parsed time frames.
#[async_trait]
pub trait FrameSource {
    fn header(&self) -> &Header;

    /// Read every remaining frame and send it on `out`.
    ///
    /// With `concurrency` greater than one, frames may arrive on the
    /// channel in arbitrary interleaving; consumers that need ordered
    /// output must re-sort by offset. Concurrency one preserves input
    /// order. The channel closes when the sender is dropped, on EOF or on
    /// error; the first parse error aborts processing and is returned.
    async fn process_frames(
        &mut self,
        concurrency: usize,
        out: mpsc::Sender<TimeFrame>,
    ) -> Result<()>;
}

/// A sink for parsed time frames. The header is written at construction
/// time by the concrete implementations.
#[async_trait]
pub trait FrameSink {
    async fn write_frame(&mut self, frame: &TimeFrame) -> Result<()>;

    /// Flush buffered output and shut the sink down.
    async fn shutdown(&mut self) -> Result<()>;
}

/// A source of raw (unparsed) time frames, for pass-through transforms.
#[async_trait]
pub trait RawFrameSource {
    fn header(&self) -> &Header;

    /// Read the next raw frame. `None` at a clean end of stream; EOF in
    /// the middle of a frame is an error.
    async fn read_raw_frame(&mut self) -> Result<Option<RawTimeFrame>>;
}

/// A sink that copies raw frames through unchanged, apart from their
/// offset line.
#[async_trait]
pub trait RawFrameSink {
    async fn write_header(&mut self, header: &Header) -> Result<()>;

    async fn write_raw_frame(&mut self, frame: &RawTimeFrame) -> Result<()>;

    async fn shutdown(&mut self) -> Result<()>;
}
