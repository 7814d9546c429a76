//! In-memory extended attributes for testing.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::backend::ExtendedAttributes;
use crate::error::XattrError;

/// Number of calls made to each primitive operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub get: usize,
    pub set: usize,
    pub remove: usize,
    pub list: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.get + self.set + self.remove + self.list
    }
}

/// An [`ExtendedAttributes`] store that keeps attributes in memory.
///
/// Suitable for:
/// - Counting how often the store reaches the primitive
/// - Injecting failures such as an unsupported volume
/// - Tests on filesystems without extended-attribute support
///
/// Every operation still checks that the path exists, so deleting the file
/// behaves as it would on disk.
#[derive(Debug, Default)]
pub struct MemoryAttributes {
    files: Mutex<HashMap<PathBuf, BTreeMap<String, Vec<u8>>>>,
    failure: Mutex<Option<XattrError>>,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `error` (`None` to stop).
    pub fn set_failure(&self, error: Option<XattrError>) {
        *self.failure.lock() = error;
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            get: self.get_calls.load(Ordering::SeqCst),
            set: self.set_calls.load(Ordering::SeqCst),
            remove: self.remove_calls.load(Ordering::SeqCst),
            list: self.list_calls.load(Ordering::SeqCst),
        }
    }

    pub fn reset_calls(&self) {
        self.get_calls.store(0, Ordering::SeqCst);
        self.set_calls.store(0, Ordering::SeqCst);
        self.remove_calls.store(0, Ordering::SeqCst);
        self.list_calls.store(0, Ordering::SeqCst);
    }

    /// Bytes stored under `key`, without counting a call.
    pub fn raw(&self, path: &Path, key: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path)?.get(key).cloned()
    }

    /// Store bytes directly, without counting a call.
    pub fn insert_raw(&self, path: &Path, key: impl Into<String>, value: Vec<u8>) {
        self.files
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .insert(key.into(), value);
    }

    fn check(&self, path: &Path) -> Result<(), XattrError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        if !path.exists() {
            return Err(XattrError::FileMissing);
        }
        Ok(())
    }
}

impl ExtendedAttributes for MemoryAttributes {
    fn get(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>, XattrError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check(path)?;
        Ok(self.raw(path, key))
    }

    fn set(&self, path: &Path, key: &str, value: &[u8]) -> Result<(), XattrError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check(path)?;
        self.insert_raw(path, key, value.to_vec());
        Ok(())
    }

    fn remove(&self, path: &Path, key: &str) -> Result<(), XattrError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.check(path)?;
        if let Some(attributes) = self.files.lock().get_mut(path) {
            attributes.remove(key);
        }
        Ok(())
    }

    fn list(&self, path: &Path) -> Result<Vec<String>, XattrError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check(path)?;
        Ok(self
            .files
            .lock()
            .get(path)
            .map(|attributes| attributes.keys().cloned().collect())
            .unwrap_or_default())
    }
}
