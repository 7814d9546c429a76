//! Field descriptors and keyed access for routed types.
//!
//! `#[properties]` implements [`Properties`] for the struct it rewrites.

use crate::{PropertyAccessor, TypeTag, Value};

/// One routed field of a `#[properties]` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The Rust field name.
    pub name: &'static str,
    /// Attribute name the field is stored under (the field name unless
    /// overridden with `#[property(key = "...")]`).
    pub key: &'static str,
    pub declared_type: TypeTag,
}

/// Types whose fields are routed through a [`PropertyAccessor`].
///
/// # Example
///
/// ```text
/// #[properties]
/// pub struct EditorState {
///     cursor_offset: u64,
///     zoom: f32,
///     #[property(ignore)]
///     dirty: bool,
/// }
///
/// let state = EditorState::new(accessor, false);
/// state.set_zoom(1.5);
/// assert_eq!(state.get("zoom"), Some(Value::Float32(1.5)));
/// ```
pub trait Properties {
    /// Descriptors for every routed field, in declaration order.
    fn properties() -> &'static [FieldDescriptor]
    where
        Self: Sized;

    /// The store the fields are routed through.
    fn accessor(&self) -> &dyn PropertyAccessor;

    /// Find the descriptor stored under `key`.
    fn descriptor(key: &str) -> Option<&'static FieldDescriptor>
    where
        Self: Sized,
    {
        Self::properties().iter().find(|d| d.key == key)
    }

    /// Read any attribute by key.
    ///
    /// Declared keys decode with their declared type. Undeclared keys are
    /// treated as self-describing archived objects.
    fn get(&self, key: &str) -> Option<Value>
    where
        Self: Sized,
    {
        self.accessor().read_property(key, Self::subscript_tag(key))
    }

    /// Write (or with `None`, remove) any attribute by key.
    fn set(&self, key: &str, value: Option<Value>)
    where
        Self: Sized,
    {
        self.accessor()
            .write_property(key, Self::subscript_tag(key), value)
    }

    #[doc(hidden)]
    fn subscript_tag(key: &str) -> TypeTag
    where
        Self: Sized,
    {
        Self::descriptor(key)
            .map(|d| d.declared_type)
            .unwrap_or(TypeTag::ArchivableObject)
    }
}
