//! In-memory accessor for tests and ephemeral objects.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::codec::{decode, encode};
use crate::{PropertyAccessor, TypeTag, Value};

/// A [`PropertyAccessor`] that keeps encoded values in a map.
///
/// Values go through the same typed codec as persistent stores, so a value
/// written under one tag and read under another comes back as `None`.
#[derive(Debug, Default)]
pub struct MemoryAccessor {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryAccessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes stored for `name`.
    pub fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(name).cloned()
    }

    /// Replace the raw bytes for `name`, bypassing the codec.
    pub fn insert_raw(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.lock().insert(name.into(), bytes);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PropertyAccessor for MemoryAccessor {
    fn read_property(&self, name: &str, tag: TypeTag) -> Option<Value> {
        let entries = self.entries.lock();
        let bytes = entries.get(name)?;
        decode(tag, bytes).ok()
    }

    fn write_property(&self, name: &str, tag: TypeTag, value: Option<Value>) {
        let mut entries = self.entries.lock();
        match value {
            None => {
                entries.remove(name);
            }
            Some(value) => {
                if let Ok(bytes) = encode(tag, &value) {
                    entries.insert(name.to_string(), bytes);
                }
            }
        }
    }
}
