//! Operating-system extended attributes.

use std::path::Path;

use crate::backend::ExtendedAttributes;
use crate::error::{ATTRIBUTE_NOT_FOUND, XattrError};

/// Unprivileged attributes on Linux must live in the `user.` namespace.
#[cfg(any(target_os = "linux", target_os = "android"))]
const NAMESPACE: &str = "user.";
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const NAMESPACE: &str = "";

/// [`ExtendedAttributes`] backed by the `xattr` crate.
///
/// Attributes follow symlinks, like the file APIs the path was resolved
/// with.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAttributes;

impl SystemAttributes {
    pub fn new() -> Self {
        Self
    }

    fn os_name(key: &str) -> String {
        format!("{}{}", NAMESPACE, key)
    }
}

impl ExtendedAttributes for SystemAttributes {
    fn get(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>, XattrError> {
        match xattr::get(path, Self::os_name(key)) {
            Ok(value) => Ok(value),
            Err(e) if e.raw_os_error() == Some(ATTRIBUTE_NOT_FOUND) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, path: &Path, key: &str, value: &[u8]) -> Result<(), XattrError> {
        xattr::set(path, Self::os_name(key), value).map_err(XattrError::from)
    }

    fn remove(&self, path: &Path, key: &str) -> Result<(), XattrError> {
        match xattr::remove(path, Self::os_name(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.raw_os_error() == Some(ATTRIBUTE_NOT_FOUND) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, path: &Path) -> Result<Vec<String>, XattrError> {
        let names = xattr::list(path).map_err(XattrError::from)?;
        Ok(names
            .filter_map(|name| name.into_string().ok())
            .filter_map(|name| name.strip_prefix(NAMESPACE).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // tmpfs and some container filesystems refuse user attributes, so these
    // tests accept `Unsupported` as an outcome and only check behavior when
    // the volume cooperates.
    fn probe(path: &Path) -> bool {
        SystemAttributes.set(path, "probe", b"1").is_ok()
    }

    #[test]
    fn missing_attribute_is_none() {
        let file = tempfile::NamedTempFile::new().unwrap();
        match SystemAttributes.get(file.path(), "file-attributes.absent") {
            Ok(value) => assert!(value.is_none()),
            Err(e) => assert_eq!(e, XattrError::Unsupported),
        }
    }

    #[test]
    fn set_get_list_remove() {
        let file = tempfile::NamedTempFile::new().unwrap();
        if !probe(file.path()) {
            return;
        }
        let backend = SystemAttributes::new();
        backend.set(file.path(), "app.count", b"42").unwrap();
        assert_eq!(
            backend.get(file.path(), "app.count").unwrap(),
            Some(b"42".to_vec())
        );
        assert!(
            backend
                .list(file.path())
                .unwrap()
                .contains(&"app.count".to_string())
        );

        backend.remove(file.path(), "app.count").unwrap();
        assert!(backend.get(file.path(), "app.count").unwrap().is_none());
        // Removing again is not an error.
        backend.remove(file.path(), "app.count").unwrap();
    }

    #[test]
    fn deleted_file_is_reported() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        drop(file);
        let error = SystemAttributes.get(&path, "app.count").unwrap_err();
        assert!(matches!(
            error,
            XattrError::FileMissing | XattrError::Unsupported
        ));
    }
}
