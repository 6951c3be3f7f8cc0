//! Rewrite a recording, optionally excluding objects by property.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::frame::TimeFrame;
use crate::object::Object;
use crate::traits::{FrameSink, FrameSource};

const FRAME_CHANNEL_DEPTH: usize = 16;

/// Re-emit every frame through `writer`. An object that appears with any
/// matching exclusion pair is dropped from the output from that frame on;
/// deleting a filtered object removes it from the filtered set (the
/// deletion line passes through). With concurrency > 1, frames are
/// collected and re-sorted by offset before writing.
pub async fn normalize(
    reader: &mut (dyn FrameSource + Send),
    writer: &mut (dyn FrameSink + Send),
    exclusions: &HashMap<String, String>,
    concurrency: usize,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(FRAME_CHANNEL_DEPTH);

    let consumer = async {
        let mut filtered: HashSet<u64> = HashSet::new();
        let mut collected: Vec<TimeFrame> = Vec::new();
        while let Some(mut frame) = rx.recv().await {
            apply_exclusions(&mut frame, exclusions, &mut filtered);
            if concurrency <= 1 {
                writer.write_frame(&frame).await?;
            } else {
                collected.push(frame);
            }
        }
        if concurrency > 1 {
            collected.sort_by(|a, b| a.offset.total_cmp(&b.offset));
            for frame in &collected {
                writer.write_frame(frame).await?;
            }
        }
        writer.shutdown().await?;
        Ok::<(), Error>(())
    };

    let (process_result, write_result) =
        tokio::join!(reader.process_frames(concurrency, tx), consumer);
    process_result?;
    write_result
}

fn apply_exclusions(
    frame: &mut TimeFrame,
    exclusions: &HashMap<String, String>,
    filtered: &mut HashSet<u64>,
) {
    frame.objects.retain(|object| {
        if object.deleted && filtered.contains(&object.id) {
            filtered.remove(&object.id);
            return true;
        }
        if filtered.contains(&object.id) {
            return false;
        }
        if is_excluded(object, exclusions) {
            filtered.insert(object.id);
            return false;
        }
        true
    });
}

fn is_excluded(object: &Object, exclusions: &HashMap<String, String>) -> bool {
    exclusions
        .iter()
        .any(|(key, value)| object.get(key).is_some_and(|p| p.value == *value))
}
