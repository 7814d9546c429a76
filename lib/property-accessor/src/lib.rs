//! Property Accessor - route declared struct fields through a backing store.
//!
//! A struct annotated with [`properties`] no longer keeps its fields in
//! memory. Each field becomes a getter/setter pair that calls the two hooks
//! of a [`PropertyAccessor`], tagged with the field's [`TypeTag`] so the
//! store knows how to marshal it.
//!
//! # Core Concepts
//!
//! - **TypeTag**: the closed set of value kinds (integers, floats, booleans,
//!   dates, strings, bytes, lists, maps, archived objects).
//! - **Value**: a decoded value of one of those kinds.
//! - **FieldDescriptor**: name, attribute key and tag of one routed field,
//!   built at compile time.
//!
//! # Traits
//!
//! - [`PropertyAccessor`]: the read/write hooks a backing store implements
//! - [`Properties`]: descriptor table and keyed access for routed types
//! - [`PropertyValue`]: Rust types that map onto a [`TypeTag`]
//!
//! # Example
//!
//! ```text
//! use property_accessor::{properties, MemoryAccessor};
//!
//! #[properties]
//! pub struct Bookmark {
//!     page: u32,
//!     title: Option<String>,
//! }
//!
//! let bookmark = Bookmark::new(Arc::new(MemoryAccessor::new()));
//! bookmark.set_page(12);
//! assert_eq!(bookmark.page(), 12);
//! ```
//!
//! # Compile-time checks
//!
//! A well-formed routed struct:
//!
//! ```
//! use std::sync::Arc;
//! use property_accessor::{MemoryAccessor, properties};
//!
//! #[properties]
//! struct Counter {
//!     value: i64,
//!     #[property(key = "label")]
//!     name: Option<String>,
//!     #[property(ignore)]
//!     scratch: u8,
//! }
//!
//! let counter = Counter::new(Arc::new(MemoryAccessor::new()), 0);
//! counter.set_value(3);
//! assert_eq!(counter.value(), 3);
//! assert_eq!(counter.name(), None);
//! assert_eq!(counter.scratch, 0);
//! ```
//!
//! A field type with no [`TypeTag`] is rejected:
//!
//! ```compile_fail
//! use property_accessor::properties;
//!
//! #[derive(Default)]
//! struct Opaque;
//!
//! #[properties]
//! struct Holder {
//!     value: Opaque,
//! }
//! ```
//!
//! So is an unknown field option:
//!
//! ```compile_fail
//! use property_accessor::properties;
//!
//! #[properties]
//! struct Holder {
//!     #[property(bogus)]
//!     value: i64,
//! }
//! ```
//!
//! Two fields stored under one key:
//!
//! ```compile_fail
//! use property_accessor::properties;
//!
//! #[properties]
//! struct Holder {
//!     #[property(key = "shared")]
//!     first: i64,
//!     #[property(key = "shared")]
//!     second: i64,
//! }
//! ```
//!
//! `ignore` combined with another option:
//!
//! ```compile_fail
//! use property_accessor::properties;
//!
//! #[properties]
//! struct Holder {
//!     #[property(ignore, key = "other")]
//!     value: i64,
//! }
//! ```
//!
//! Tuple structs, generic structs and enums:
//!
//! ```compile_fail
//! use property_accessor::properties;
//!
//! #[properties]
//! struct Pair(i64, i64);
//! ```
//!
//! ```compile_fail
//! use property_accessor::properties;
//!
//! #[properties]
//! struct Wrapper<T> {
//!     value: i64,
//!     marker: std::marker::PhantomData<T>,
//! }
//! ```
//!
//! ```compile_fail
//! use property_accessor::properties;
//!
//! #[properties]
//! enum Choice {
//!     Left,
//!     Right,
//! }
//! ```

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::unwrap_in_result,
        clippy::panic
    )
)]

mod accessor;
pub mod archive;
pub mod codec;
mod error;
mod memory;
mod properties;
mod tag;
pub mod time;
mod value;

pub use accessor::PropertyAccessor;
pub use error::CodecError;
pub use memory::MemoryAccessor;
pub use properties::{FieldDescriptor, Properties};
pub use tag::TypeTag;
pub use value::{PropertyValue, Value, archive_object, unarchive_object};

// Re-export the attribute macro
pub use property_accessor_derive::properties;
