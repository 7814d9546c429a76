//! File Attributes - typed properties stored in a file's extended attributes.
//!
//! [`FileAttributes`] implements [`PropertyAccessor`] on top of the
//! extended attributes of one file. Combined with the `#[properties]`
//! attribute macro, the fields of a struct read and write straight through
//! to the file's metadata, which follows the file when it is moved or copied
//! within the same volume.
//!
//! # Usage
//!
//! ```text
//! use file_attributes::{FileAttributes, properties};
//!
//! #[properties(backing = FileAttributes)]
//! pub struct DocumentState {
//!     pub cursor_offset: u64,
//!     pub last_opened: Option<DateTime<Utc>>,
//! }
//!
//! let state = DocumentState::new(FileAttributes::shared("notes.txt")?);
//! state.set_cursor_offset(1024);
//! if let Some(error) = state.backing().latest_error() {
//!     // the write did not reach the disk
//! }
//! ```
//!
//! # Construction
//!
//! - [`FileAttributes::shared`] - one cached instance per file, process-wide
//! - [`FileAttributes::open`] / [`FileAttributes::open_with`] - independent
//!   instances, optionally uncached
//! - [`FileAttributes::with_backend`] / [`AttributeRegistry::with_backend`] -
//!   a custom primitive such as [`MemoryAttributes`]

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::unwrap_in_result,
        clippy::panic
    )
)]

mod attributes;
mod backend;
mod config;
mod error;
mod memory;
mod registry;
mod system;

pub use attributes::FileAttributes;
pub use backend::ExtendedAttributes;
pub use config::{
    AttributesConfig, FALLBACK_PREFIX, PREFIX_ENV, default_identifier_prefix,
    resolve_identifier_prefix,
};
pub use error::{AttributeError, XattrError};
pub use memory::{CallCounts, MemoryAttributes};
pub use registry::AttributeRegistry;
pub use system::SystemAttributes;

// Re-export core types for convenience
pub use property_accessor::{
    CodecError, FieldDescriptor, Properties, PropertyAccessor, PropertyValue, TypeTag, Value,
    properties,
};
