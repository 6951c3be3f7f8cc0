//! The parallel frame-parsing pipeline.
//!
//! A single producer splits the byte stream into per-frame buffers on
//! `#`-prefixed lines and feeds them to a pool of parsing workers through a
//! bounded queue. Workers are pure (bytes in, frame or error out) and
//! emit onto the consumer channel. With more than one worker, output
//! ordering is arbitrary; consumers re-sort by offset when they need file
//! order. The first parse error cancels the whole pipeline and is
//! returned; a consumer that drops its receiver cancels it too.

use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::frame::TimeFrame;
use crate::text::parser::{parse_frame_buffer, LineReader};

/// Work-queue slots per worker.
const WORK_QUEUE_DEPTH: usize = 2;

pub(crate) async fn process_frames<R>(
    lines: &mut LineReader<R>,
    concurrency: usize,
    out: mpsc::Sender<TimeFrame>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin + Send,
{
    if concurrency <= 1 {
        process_sequential(lines, out).await
    } else {
        process_parallel(lines, concurrency, out).await
    }
}

/// Strict input order: split, parse and emit on the current task.
async fn process_sequential<R>(
    lines: &mut LineReader<R>,
    out: mpsc::Sender<TimeFrame>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut splitter = FrameSplitter::new(lines);
    while let Some(buffer) = splitter.next_frame().await? {
        let frame = parse_frame_buffer(&buffer)?;
        if out.send(frame).await.is_err() {
            // Consumer hung up.
            break;
        }
    }
    Ok(())
}

async fn process_parallel<R>(
    lines: &mut LineReader<R>,
    concurrency: usize,
    out: mpsc::Sender<TimeFrame>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let cancel = CancellationToken::new();
    let (work_tx, work_rx) = flume::bounded::<Vec<u8>>(concurrency * WORK_QUEUE_DEPTH);

    let mut workers: JoinSet<Result<()>> = JoinSet::new();
    for _ in 0..concurrency {
        let work_rx = work_rx.clone();
        let out = out.clone();
        let cancel = cancel.clone();
        workers.spawn(async move {
            while let Ok(buffer) = work_rx.recv_async().await {
                let frame = match parse_frame_buffer(&buffer) {
                    Ok(frame) => frame,
                    Err(e) => {
                        cancel.cancel();
                        return Err(e);
                    }
                };
                if out.send(frame).await.is_err() {
                    cancel.cancel();
                    break;
                }
            }
            Ok(())
        });
    }
    // Only the workers hold the queue receiver and the output sender now,
    // so both close once the producer stops and the workers drain.
    drop(work_rx);
    drop(out);

    let mut splitter = FrameSplitter::new(lines);
    let mut produce_error = None;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            next = splitter.next_frame() => match next {
                Ok(Some(buffer)) => {
                    if work_tx.send_async(buffer).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    produce_error = Some(e);
                    break;
                }
            },
        }
    }
    drop(work_tx);

    let mut worker_error = None;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if worker_error.is_none() {
                    worker_error = Some(e);
                }
            }
            Err(join_error) => {
                if worker_error.is_none() {
                    worker_error =
                        Some(Error::FrameParse(format!("frame worker failed: {join_error}")));
                }
            }
        }
    }

    match (produce_error, worker_error) {
        (Some(e), _) => Err(e),
        (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    }
}

/// Splits the remaining byte stream into one buffer per time frame.
///
/// Physical lines accumulate until the next `#` line; that line starts the
/// following buffer. The final buffer is emitted at EOF.
struct FrameSplitter<'a, R> {
    lines: &'a mut LineReader<R>,
    buffer: Vec<u8>,
    done: bool,
}

impl<'a, R: AsyncBufRead + Unpin> FrameSplitter<'a, R> {
    fn new(lines: &'a mut LineReader<R>) -> Self {
        Self {
            lines,
            buffer: Vec::new(),
            done: false,
        }
    }

    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let Some(line) = self.lines.read_line().await? else {
                self.done = true;
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buffer)));
            };
            if !line.starts_with(b"#") {
                self.buffer.extend_from_slice(&line);
                continue;
            }
            if self.buffer.is_empty() {
                self.buffer = line;
                continue;
            }
            return Ok(Some(std::mem::replace(&mut self.buffer, line)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect_frames(data: &str, concurrency: usize) -> Result<Vec<TimeFrame>> {
        let mut lines = LineReader::new(data.as_bytes());
        let (tx, mut rx) = mpsc::channel(16);
        let consumer = async {
            let mut frames = Vec::new();
            while let Some(frame) = rx.recv().await {
                frames.push(frame);
            }
            frames
        };
        let (result, frames) = tokio::join!(process_frames(&mut lines, concurrency, tx), consumer);
        result.map(|_| frames)
    }

    const FRAMES: &str = "#1.0\na1,Pilot=Alpha\n#2.0\na1,Pilot=Bravo\nb2,Pilot=Delta\n#3.0\n-b2\n";

    #[tokio::test]
    async fn test_sequential_preserves_order() {
        let frames = collect_frames(FRAMES, 1).await.unwrap();
        let offsets: Vec<f64> = frames.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![1.0, 2.0, 3.0]);
        assert_eq!(frames[1].objects.len(), 2);
        assert!(frames[2].get(0xb2).unwrap().deleted);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential_after_sorting() {
        let mut data = String::new();
        for i in 1..200 {
            data.push_str(&format!("#{i}.0\na{i:x},Pilot=P{i}\n"));
        }
        let sequential = collect_frames(&data, 1).await.unwrap();
        let mut parallel = collect_frames(&data, 4).await.unwrap();
        parallel.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        assert_eq!(parallel, sequential);
    }

    #[tokio::test]
    async fn test_parse_error_terminates_pipeline() {
        let data = "#1.0\na1,Pilot=Alpha\n#bogus\na2,Pilot=Bravo\n";
        for concurrency in [1, 4] {
            let result = collect_frames(data, concurrency).await;
            assert!(result.is_err(), "concurrency {concurrency}");
        }
    }

    #[tokio::test]
    async fn test_dropped_consumer_does_not_deadlock() {
        let mut data = String::new();
        for i in 1..500 {
            data.push_str(&format!("#{i}.0\na1,Pilot=P{i}\n"));
        }
        let mut lines = LineReader::new(data.as_bytes());
        let (tx, mut rx) = mpsc::channel(1);
        let consumer = async {
            // Read a single frame, then hang up.
            let first = rx.recv().await;
            drop(rx);
            first
        };
        let (result, first) = tokio::join!(process_frames(&mut lines, 4, tx), consumer);
        assert!(result.is_ok());
        assert!(first.is_some());
    }
}
