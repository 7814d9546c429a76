//! The extended-attribute primitive the store is built on.

use std::fmt::Debug;
use std::path::Path;

use crate::error::XattrError;

/// A key → bytes store scoped to one file path.
///
/// # Invariants
///
/// - `get` of a missing key is `Ok(None)`, never an error
/// - `remove` of a missing key succeeds
/// - `list` returns keys exactly as they were passed to `set`
///
/// # Implementors
///
/// - [`crate::SystemAttributes`] - The operating system's extended attributes
/// - [`crate::MemoryAttributes`] - For testing
pub trait ExtendedAttributes: Send + Sync + Debug {
    fn get(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>, XattrError>;

    fn set(&self, path: &Path, key: &str, value: &[u8]) -> Result<(), XattrError>;

    fn remove(&self, path: &Path, key: &str) -> Result<(), XattrError>;

    fn list(&self, path: &Path) -> Result<Vec<String>, XattrError>;
}
