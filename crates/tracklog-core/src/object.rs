//! Battlefield objects and their ordered property lists.

use serde::{Deserialize, Serialize};

use crate::property::Property;

/// A single object present or mutated in a time frame.
///
/// Properties keep insertion order (the observable wire order) and keys
/// are unique within a frame: `set` updates an existing key in place and
/// appends a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Object id, printed as lowercase hex on the wire.
    pub id: u64,
    pub properties: Vec<Property>,
    /// True when this frame removes the object.
    pub deleted: bool,
}

impl Object {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            properties: Vec::new(),
            deleted: false,
        }
    }

    /// Build a deletion marker for `id`.
    pub fn deletion(id: u64) -> Self {
        Self {
            id,
            properties: Vec::new(),
            deleted: true,
        }
    }

    /// Return the property for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Update `key` in place, or append it.
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(existing) = self.properties.iter_mut().find(|p| p.key == key) {
            existing.value = value.to_string();
        } else {
            self.properties.push(Property::new(key, value));
        }
    }
}
