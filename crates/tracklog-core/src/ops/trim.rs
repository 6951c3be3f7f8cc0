//! Temporal trim.
//!
//! Reduces a recording to the `[start, end]` offset window. Every delta
//! frame before `start` is folded into a live-object map so the output's
//! initial frame shows each surviving object with the most recent value of
//! every property; in-window frames are copied through raw with their
//! offsets rebased to the new start.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::frame::TimeFrame;
use crate::header::{format_reference_time, Header, GLOBAL_OBJECT_ID, REFERENCE_TIME_PROPERTY};
use crate::object::Object;
use crate::traits::{RawFrameSink, RawFrameSource};

pub async fn trim(
    reader: &mut (dyn RawFrameSource + Send),
    writer: &mut (dyn RawFrameSink + Send),
    start: f64,
    end: f64,
) -> Result<()> {
    if end < start || start < 0.0 {
        return Err(Error::Config(format!(
            "invalid trim window {start}..{end}"
        )));
    }

    let header = reader.header().clone();

    // Fold pre-window deltas into the set of objects alive at `start`.
    // The first frame at or past `start` is held over for the copy phase.
    let mut alive: HashMap<u64, Object> = HashMap::new();
    let mut held = None;
    while let Some(raw) = reader.read_raw_frame().await? {
        if raw.offset >= start {
            held = Some(raw);
            break;
        }
        fold_frame(&mut alive, raw.parse()?);
    }
    debug!(count = alive.len(), "objects alive at trim start");

    let reference_time = header.reference_time + Duration::seconds(start as i64);

    let mut initial = TimeFrame::new(0.0);
    initial.objects = header.initial_time_frame.objects.clone();
    let mut folded: Vec<Object> = alive.into_values().collect();
    folded.sort_by_key(|object| object.id);
    for object in folded {
        if let Some(slot) = initial.objects.iter().position(|o| o.id == object.id) {
            let existing = &mut initial.objects[slot];
            for property in object.properties {
                existing.set(&property.key, &property.value);
            }
        } else {
            initial.objects.push(object);
        }
    }
    if let Some(global) = initial.get_mut(GLOBAL_OBJECT_ID) {
        global.set(
            REFERENCE_TIME_PROPERTY,
            &format_reference_time(reference_time),
        );
    }

    writer
        .write_header(&Header {
            file_type: header.file_type.clone(),
            file_version: header.file_version.clone(),
            reference_time,
            initial_time_frame: initial,
        })
        .await?;

    let mut written = 0usize;
    if let Some(first) = held {
        if first.offset <= end {
            let mut raw = first;
            raw.offset -= start;
            writer.write_raw_frame(&raw).await?;
            written += 1;

            while let Some(mut raw) = reader.read_raw_frame().await? {
                if raw.offset > end {
                    break;
                }
                if raw.offset < start {
                    // Out-of-order stragglers would rebase negative.
                    continue;
                }
                raw.offset -= start;
                writer.write_raw_frame(&raw).await?;
                written += 1;
            }
        }
    }

    if written == 0 {
        return Err(Error::EmptyRange);
    }

    debug!(count = written, "frames written");
    writer.shutdown().await
}

fn fold_frame(alive: &mut HashMap<u64, Object>, frame: TimeFrame) {
    for object in frame.objects {
        if object.deleted {
            alive.remove(&object.id);
            continue;
        }
        match alive.entry(object.id) {
            Entry::Occupied(mut existing) => {
                for property in object.properties {
                    existing.get_mut().set(&property.key, &property.value);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(object);
            }
        }
    }
}
