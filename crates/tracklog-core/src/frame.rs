//! Time frames: parsed and raw.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::object::Object;
use crate::text::parser::parse_object_line;

/// A set of object state deltas at one offset (seconds since the
/// recording's reference time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeFrame {
    pub offset: f64,
    pub objects: Vec<Object>,
}

impl TimeFrame {
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            objects: Vec::new(),
        }
    }

    /// Return the object with `id`, if present.
    pub fn get(&self, id: u64) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Object> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Remove the object with `id`, if present.
    pub fn delete(&mut self, id: u64) {
        self.objects.retain(|o| o.id != id);
    }
}

/// A frame preserved as its original wire lines.
///
/// Each entry is one logical object line with escape sequences intact
/// (including `\` + newline continuations), so the trim operation can copy
/// untouched frames byte for byte without a parse/serialize round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTimeFrame {
    pub offset: f64,
    pub lines: Vec<Vec<u8>>,
}

impl RawTimeFrame {
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            lines: Vec::new(),
        }
    }

    /// Parse the preserved lines into a [`TimeFrame`].
    pub fn parse(&self) -> Result<TimeFrame> {
        let mut frame = TimeFrame::new(self.offset);
        let mut index = HashMap::new();
        for line in &self.lines {
            parse_object_line(line, &mut frame, &mut index)?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_delete() {
        let mut frame = TimeFrame::new(1.0);
        frame.objects.push(Object::new(1));
        frame.objects.push(Object::new(2));
        assert!(frame.get(2).is_some());
        frame.delete(1);
        assert!(frame.get(1).is_none());
        assert_eq!(frame.objects.len(), 1);
    }

    #[test]
    fn test_raw_frame_parse() {
        let raw = RawTimeFrame {
            offset: 2.5,
            lines: vec![
                b"a1b2,Pilot=Alpha,Type=Air+FixedWing".to_vec(),
                b"-c3".to_vec(),
            ],
        };
        let frame = raw.parse().unwrap();
        assert_eq!(frame.offset, 2.5);
        assert_eq!(frame.objects.len(), 2);
        assert_eq!(frame.get(0xa1b2).unwrap().get("Pilot").unwrap().value, "Alpha");
        assert!(frame.get(0xc3).unwrap().deleted);
    }

    #[test]
    fn test_raw_frame_parse_merges_repeat_ids() {
        let raw = RawTimeFrame {
            offset: 0.0,
            lines: vec![
                b"1,Pilot=Alpha".to_vec(),
                b"2,Pilot=Delta".to_vec(),
                b"1,Pilot=Bravo".to_vec(),
            ],
        };
        let frame = raw.parse().unwrap();
        assert_eq!(frame.objects.len(), 2);
        // First-appearance order, latest value.
        assert_eq!(frame.objects[0].id, 1);
        assert_eq!(frame.objects[0].get("Pilot").unwrap().value, "Bravo");
    }
}
