use thiserror::Error;

use crate::TypeTag;

/// Errors raised while turning a [`crate::Value`] into attribute bytes or back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("expected a {expected} value, got {actual}")]
    TypeMismatch { expected: TypeTag, actual: TypeTag },

    #[error("expected {expected} bytes for {tag}, got {actual}")]
    InvalidWidth {
        tag: TypeTag,
        expected: usize,
        actual: usize,
    },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    #[error("invalid archive magic")]
    InvalidMagic,

    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown archive tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("archive nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("{0} trailing bytes after archived value")]
    TrailingBytes(usize),

    #[error("length {0} does not fit in an archive")]
    TooLong(usize),

    #[error("map key {0:?} is repeated or out of order")]
    UnorderedKey(String),

    #[error("timestamp out of range: {0}")]
    DateOutOfRange(i64),

    #[error("archived object error: {0}")]
    Object(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Object(e.to_string())
    }
}
