use std::io;

use property_accessor::CodecError;
use thiserror::Error;

/// Failures of the extended-attribute primitive.
///
/// "Attribute not found" is not an error: reads report it as `Ok(None)` and
/// removing an absent attribute succeeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XattrError {
    #[error("extended attributes are not supported on this volume")]
    Unsupported,

    #[error("permission denied")]
    PermissionDenied,

    #[error("no space left for extended attributes")]
    NoSpace,

    #[error("attribute name too long")]
    NameTooLong,

    #[error("attribute value too large")]
    ValueTooLarge,

    #[error("file no longer exists")]
    FileMissing,

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for XattrError {
    fn from(e: io::Error) -> Self {
        match e.raw_os_error() {
            Some(code) => classify_errno(code).unwrap_or_else(|| XattrError::Io(e.to_string())),
            None => match e.kind() {
                io::ErrorKind::Unsupported => XattrError::Unsupported,
                io::ErrorKind::PermissionDenied => XattrError::PermissionDenied,
                io::ErrorKind::NotFound => XattrError::FileMissing,
                _ => XattrError::Io(e.to_string()),
            },
        }
    }
}

fn classify_errno(code: i32) -> Option<XattrError> {
    let error = match code {
        libc::ENOTSUP => XattrError::Unsupported,
        #[allow(unreachable_patterns)]
        libc::EOPNOTSUPP => XattrError::Unsupported,
        libc::EACCES | libc::EPERM => XattrError::PermissionDenied,
        libc::ENOSPC | libc::EDQUOT => XattrError::NoSpace,
        libc::ENAMETOOLONG | libc::ERANGE => XattrError::NameTooLong,
        libc::E2BIG => XattrError::ValueTooLarge,
        libc::ENOENT | libc::ENOTDIR => XattrError::FileMissing,
        _ => return None,
    };
    Some(error)
}

/// errno reported when an attribute does not exist.
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
pub(crate) const ATTRIBUTE_NOT_FOUND: i32 = libc::ENOATTR;
#[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "freebsd")))]
pub(crate) const ATTRIBUTE_NOT_FOUND: i32 = libc::ENODATA;

/// What [`crate::FileAttributes::latest_error`] reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    #[error("extended attribute `{key}`: {source}")]
    Storage { key: String, source: XattrError },

    #[error("failed to decode `{key}`: {source}")]
    Decode { key: String, source: CodecError },

    #[error("failed to encode `{key}`: {source}")]
    Encode { key: String, source: CodecError },
}

impl AttributeError {
    /// The attribute key the failed operation addressed.
    pub fn key(&self) -> &str {
        match self {
            AttributeError::Storage { key, .. }
            | AttributeError::Decode { key, .. }
            | AttributeError::Encode { key, .. } => key,
        }
    }

    /// True when the volume has no extended-attribute support at all.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            AttributeError::Storage {
                source: XattrError::Unsupported,
                ..
            }
        )
    }
}
