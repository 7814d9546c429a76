//! Identity cache: one shared [`FileAttributes`] per canonical path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::debug;

use crate::attributes::FileAttributes;
use crate::backend::ExtendedAttributes;
use crate::config::AttributesConfig;
use crate::system::SystemAttributes;

/// Maps canonical file paths to their shared [`FileAttributes`].
///
/// Lookup and insertion happen under one lock, so concurrent callers asking
/// for the same new file all receive the same instance. Entries are never
/// evicted automatically; use [`release`](AttributeRegistry::release) to drop
/// one.
#[derive(Debug)]
pub struct AttributeRegistry {
    backend: Arc<dyn ExtendedAttributes>,
    instances: Mutex<HashMap<PathBuf, Arc<FileAttributes>>>,
}

impl AttributeRegistry {
    /// A registry over the operating system's extended attributes.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(SystemAttributes::new()))
    }

    pub fn with_backend(backend: Arc<dyn ExtendedAttributes>) -> Self {
        Self {
            backend,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// The registry behind [`FileAttributes::shared`], created on first use
    /// and kept for the life of the process.
    pub fn process() -> &'static AttributeRegistry {
        static PROCESS: OnceLock<AttributeRegistry> = OnceLock::new();
        PROCESS.get_or_init(AttributeRegistry::new)
    }

    /// The shared instance for `path`, created (cache on) if needed.
    ///
    /// Returns `None` if the file does not exist.
    pub fn shared(&self, path: impl AsRef<Path>) -> Option<Arc<FileAttributes>> {
        let path = std::fs::canonicalize(path.as_ref()).ok()?;
        let mut instances = self.instances.lock();
        let instance = instances.entry(path.clone()).or_insert_with(|| {
            debug!(path = %path.display(), "registering shared file attributes");
            Arc::new(FileAttributes::from_canonical(
                path,
                AttributesConfig::default(),
                self.backend.clone(),
            ))
        });
        Some(instance.clone())
    }

    /// Remove the entry for `path`. Existing handles keep working; the next
    /// [`shared`](AttributeRegistry::shared) call creates a fresh instance.
    pub fn release(&self, path: impl AsRef<Path>) -> Option<Arc<FileAttributes>> {
        let path = std::fs::canonicalize(path.as_ref())
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let removed = self.instances.lock().remove(&path);
        if removed.is_some() {
            debug!(path = %path.display(), "released shared file attributes");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
