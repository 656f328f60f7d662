//! JSON envelopes keyed by resource name.
//!
//! Single records render as `{"<entity>": {...}}` and listings as
//! `{"<collection>": [...], "metadata": {...}}`.

use episodic_core::filters::Metadata;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// `{ "<key>": value }`
#[derive(Debug)]
pub struct Envelope<T> {
    key: &'static str,
    value: T,
}

impl<T> Envelope<T> {
    pub fn new(key: &'static str, value: T) -> Self {
        Self { key, value }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.value)?;
        map.end()
    }
}

/// `{ "<key>": [items], "metadata": {...} }`
#[derive(Debug)]
pub struct ListEnvelope<T> {
    key: &'static str,
    items: Vec<T>,
    metadata: Metadata,
}

impl<T> ListEnvelope<T> {
    pub fn new(key: &'static str, items: Vec<T>, metadata: Metadata) -> Self {
        Self {
            key,
            items,
            metadata,
        }
    }
}

impl<T: Serialize> Serialize for ListEnvelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.key, &self.items)?;
        map.serialize_entry("metadata", &self.metadata)?;
        map.end()
    }
}
