//! Typed properties persisted in one file's extended attributes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use property_accessor::codec::{decode, encode};
use property_accessor::{PropertyAccessor, TypeTag, Value};
use tracing::{debug, warn};

use crate::backend::ExtendedAttributes;
use crate::config::{AttributesConfig, default_identifier_prefix};
use crate::error::{AttributeError, XattrError};
use crate::registry::AttributeRegistry;
use crate::system::SystemAttributes;

#[derive(Debug)]
struct State {
    identifier_prefix: Option<String>,
    cache: Option<HashMap<String, (TypeTag, Value)>>,
    latest_error: Option<AttributeError>,
}

impl State {
    fn prefix(&self) -> &str {
        match &self.identifier_prefix {
            Some(prefix) => prefix,
            None => default_identifier_prefix(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{}", self.prefix(), name)
    }

    fn cached(&self, key: &str, tag: TypeTag) -> Option<Value> {
        let (cached_tag, value) = self.cache.as_ref()?.get(key)?;
        // Entries only answer reads made with the tag they were stored under.
        (*cached_tag == tag).then(|| value.clone())
    }
}

/// The extended attributes of one file, exposed as a [`PropertyAccessor`].
///
/// Each property is stored under `"{identifier_prefix}.{name}"`. Scalars use
/// a fixed-width encoding, lists, maps and objects the versioned archive
/// format. With caching on, decoded values are kept in memory after the
/// first read or write and later reads never touch the disk.
///
/// Failures never panic and never surface through the accessor hooks; the
/// outcome of the most recent operation is available from
/// [`latest_error`](FileAttributes::latest_error).
///
/// The prefix, cache and latest error share one lock, held across each
/// primitive call, so an instance can be used from several threads. Writes to
/// different keys are independent: there is no atomicity across fields.
#[derive(Debug)]
pub struct FileAttributes {
    path: PathBuf,
    backend: Arc<dyn ExtendedAttributes>,
    state: Mutex<State>,
}

impl FileAttributes {
    /// The process-wide shared instance for `path` (cache on).
    ///
    /// Repeated calls for the same file return the same instance. Returns
    /// `None` if the file does not exist.
    pub fn shared(path: impl AsRef<Path>) -> Option<Arc<FileAttributes>> {
        AttributeRegistry::process().shared(path)
    }

    /// An independent instance with caching on. Not registered anywhere.
    pub fn open(path: impl AsRef<Path>) -> Option<Arc<FileAttributes>> {
        Self::with_config(path, AttributesConfig::default())
    }

    /// An independent instance with caching on or off.
    ///
    /// Two instances over the same file never see each other's cache, only
    /// each other's writes once they reach the disk.
    pub fn open_with(path: impl AsRef<Path>, cached: bool) -> Option<Arc<FileAttributes>> {
        Self::with_config(path, AttributesConfig::default().with_cached(cached))
    }

    pub fn with_config(
        path: impl AsRef<Path>,
        config: AttributesConfig,
    ) -> Option<Arc<FileAttributes>> {
        Self::with_backend(path, config, Arc::new(SystemAttributes::new()))
    }

    /// An independent instance over a custom extended-attribute primitive.
    pub fn with_backend(
        path: impl AsRef<Path>,
        config: AttributesConfig,
        backend: Arc<dyn ExtendedAttributes>,
    ) -> Option<Arc<FileAttributes>> {
        let path = std::fs::canonicalize(path.as_ref()).ok()?;
        Some(Arc::new(Self::from_canonical(path, config, backend)))
    }

    pub(crate) fn from_canonical(
        path: PathBuf,
        config: AttributesConfig,
        backend: Arc<dyn ExtendedAttributes>,
    ) -> Self {
        Self {
            path,
            backend,
            state: Mutex::new(State {
                identifier_prefix: config.identifier_prefix,
                cache: config.cached.then(HashMap::new),
                latest_error: None,
            }),
        }
    }

    /// The canonical path of the file, fixed at construction.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cached(&self) -> bool {
        self.state.lock().cache.is_some()
    }

    /// The failure of the most recent read or write, `None` if it succeeded.
    pub fn latest_error(&self) -> Option<AttributeError> {
        self.state.lock().latest_error.clone()
    }

    pub fn identifier_prefix(&self) -> String {
        self.state.lock().prefix().to_string()
    }

    /// Change the prefix for all later reads and writes; `None` restores the
    /// default. Attributes written under the old prefix are left in place.
    pub fn set_identifier_prefix(&self, prefix: Option<String>) {
        self.state.lock().identifier_prefix = prefix;
    }

    /// The full attribute key for a property name.
    pub fn attribute_key(&self, name: &str) -> String {
        self.state.lock().key(name)
    }

    /// Forget every cached value. The disk is untouched.
    pub fn clear_cache(&self) {
        if let Some(cache) = self.state.lock().cache.as_mut() {
            cache.clear();
        }
    }

    /// Names of the properties stored on disk under the current prefix.
    pub fn attribute_names(&self) -> Vec<String> {
        let prefix = format!("{}.", self.identifier_prefix());
        match self.backend.list(&self.path) {
            Ok(keys) => {
                self.record(Ok(()));
                keys.into_iter()
                    .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
                    .collect()
            }
            Err(source) => {
                self.record(Err(AttributeError::Storage {
                    key: prefix,
                    source,
                }));
                Vec::new()
            }
        }
    }

    fn record(&self, result: Result<(), AttributeError>) {
        let mut state = self.state.lock();
        Self::record_locked(&mut state, &self.path, result);
    }

    fn record_locked(state: &mut State, path: &Path, result: Result<(), AttributeError>) {
        match result {
            Ok(()) => state.latest_error = None,
            Err(error) => {
                warn!(path = %path.display(), %error, "extended attribute operation failed");
                state.latest_error = Some(error);
            }
        }
    }
}

impl PropertyAccessor for FileAttributes {
    fn read_property(&self, name: &str, tag: TypeTag) -> Option<Value> {
        // Held across the primitive call so a write cannot land between the
        // fetch and the cache insert and be shadowed by the older value.
        let mut state = self.state.lock();
        let key = state.key(name);

        if let Some(value) = state.cached(&key, tag) {
            // A filesystem check, not the primitive: a deleted file is still
            // reported while the cached value keeps answering.
            let result = if self.path.exists() {
                Ok(())
            } else {
                Err(AttributeError::Storage {
                    key,
                    source: XattrError::FileMissing,
                })
            };
            Self::record_locked(&mut state, &self.path, result);
            return Some(value);
        }

        debug!(path = %self.path.display(), key = %key, %tag, "reading extended attribute");
        let bytes = match self.backend.get(&self.path, &key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                state.latest_error = None;
                return None;
            }
            Err(source) => {
                let error = AttributeError::Storage { key, source };
                Self::record_locked(&mut state, &self.path, Err(error));
                return None;
            }
        };

        match decode(tag, &bytes) {
            Ok(value) => {
                if let Some(cache) = state.cache.as_mut() {
                    cache.insert(key, (tag, value.clone()));
                }
                state.latest_error = None;
                Some(value)
            }
            Err(source) => {
                let error = AttributeError::Decode { key, source };
                Self::record_locked(&mut state, &self.path, Err(error));
                None
            }
        }
    }

    fn write_property(&self, name: &str, tag: TypeTag, value: Option<Value>) {
        // Held across the primitive call so the cache never disagrees with
        // the order writes reached the disk.
        let mut state = self.state.lock();
        let key = state.key(name);

        let result = match value {
            None => self
                .backend
                .remove(&self.path, &key)
                .map(|()| None)
                .map_err(|source| AttributeError::Storage {
                    key: key.clone(),
                    source,
                }),
            Some(value) => encode(tag, &value)
                .map_err(|source| AttributeError::Encode {
                    key: key.clone(),
                    source,
                })
                .and_then(|bytes| {
                    self.backend
                        .set(&self.path, &key, &bytes)
                        .map_err(|source| AttributeError::Storage {
                            key: key.clone(),
                            source,
                        })?;
                    // Cache what a later read from disk would produce.
                    Ok(Some(decode(tag, &bytes).unwrap_or(value)))
                }),
        };

        match result {
            Ok(stored) => {
                debug!(path = %self.path.display(), key = %key, removed = stored.is_none(), "wrote extended attribute");
                if let Some(cache) = state.cache.as_mut() {
                    match stored {
                        Some(value) => {
                            cache.insert(key, (tag, value));
                        }
                        None => {
                            cache.remove(&key);
                        }
                    }
                }
                state.latest_error = None;
            }
            Err(error) => Self::record_locked(&mut state, &self.path, Err(error)),
        }
    }
}
