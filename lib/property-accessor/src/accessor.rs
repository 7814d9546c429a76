//! The two hooks every backing store implements.

use std::fmt::Debug;

use crate::{TypeTag, Value};

/// A backing store for routed properties.
///
/// Generated field accessors call these hooks for every read and write.
/// Neither hook returns an error: field-style access has no channel for
/// one, so implementations record failures on their own side (see
/// `FileAttributes::latest_error`) and report `None` from reads.
///
/// Implementations use interior mutability so a single instance can be
/// shared behind an `Arc` by every object that routes through it.
pub trait PropertyAccessor: Send + Sync + Debug {
    /// Load the value stored for `name`, decoded as `tag`.
    ///
    /// Returns `None` when nothing is stored or the stored bytes cannot be
    /// decoded as `tag`.
    fn read_property(&self, name: &str, tag: TypeTag) -> Option<Value>;

    /// Store `value` for `name` using the `tag` encoding.
    ///
    /// `None` removes the stored value entirely.
    fn write_property(&self, name: &str, tag: TypeTag, value: Option<Value>);
}
