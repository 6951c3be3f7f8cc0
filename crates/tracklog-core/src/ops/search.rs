//! Property search over the frame stream.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::frame::TimeFrame;
use crate::object::Object;
use crate::traits::FrameSource;

const FRAME_CHANNEL_DEPTH: usize = 16;

/// An object that matched the requested properties.
///
/// `object` is the property snapshot taken at the first matching frame;
/// `first_seen`/`last_seen` are the offset bounds over every later
/// appearance.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub object: Object,
    pub first_seen: f64,
    pub last_seen: f64,
}

/// Find every object that, in any single frame, carries all of the
/// required `key=value` pairs. Results are sorted by object id.
pub async fn search(
    reader: &mut (dyn FrameSource + Send),
    concurrency: usize,
    properties: &HashMap<String, String>,
) -> Result<Vec<SearchResult>> {
    if properties.is_empty() {
        return Err(Error::Config("no properties to search for".into()));
    }

    let (tx, mut rx) = mpsc::channel::<TimeFrame>(FRAME_CHANNEL_DEPTH);

    let consumer = async {
        let mut results: HashMap<u64, SearchResult> = HashMap::new();
        while let Some(frame) = rx.recv().await {
            for object in frame.objects {
                match results.entry(object.id) {
                    Entry::Occupied(mut entry) => {
                        // Frames arrive in arbitrary order with
                        // concurrency > 1, so bound in both directions.
                        let result = entry.get_mut();
                        result.first_seen = result.first_seen.min(frame.offset);
                        result.last_seen = result.last_seen.max(frame.offset);
                    }
                    Entry::Vacant(entry) => {
                        if matches(&object, properties) {
                            entry.insert(SearchResult {
                                object,
                                first_seen: frame.offset,
                                last_seen: frame.offset,
                            });
                        }
                    }
                }
            }
        }
        results
    };

    let (process_result, results) = tokio::join!(reader.process_frames(concurrency, tx), consumer);
    process_result?;

    let mut results: Vec<SearchResult> = results.into_values().collect();
    results.sort_by_key(|result| result.object.id);
    Ok(results)
}

fn matches(object: &Object, properties: &HashMap<String, String>) -> bool {
    properties
        .iter()
        .all(|(key, value)| object.get(key).is_some_and(|p| p.value == *value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_requires_every_pair() {
        let mut object = Object::new(1);
        object.set("Pilot", "Alpha");
        object.set("Type", "Air");

        let mut wanted = HashMap::new();
        wanted.insert("Pilot".to_string(), "Alpha".to_string());
        assert!(matches(&object, &wanted));

        wanted.insert("Type".to_string(), "Sea".to_string());
        assert!(!matches(&object, &wanted));
    }

    #[test]
    fn test_matches_missing_key() {
        let object = Object::new(1);
        let mut wanted = HashMap::new();
        wanted.insert("Pilot".to_string(), "Alpha".to_string());
        assert!(!matches(&object, &wanted));
    }
}
