use std::fmt;

/// The closed set of value kinds a property can carry.
///
/// A field's tag is fixed at compile time by the `#[properties]` macro and
/// decides how its value is marshalled to and from bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Integer,
    Float32,
    Float64,
    Boolean,
    Date,
    String,
    Bytes,
    OrderedList,
    KeyedMap,
    ArchivableObject,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Integer => "integer",
            TypeTag::Float32 => "float32",
            TypeTag::Float64 => "float64",
            TypeTag::Boolean => "boolean",
            TypeTag::Date => "date",
            TypeTag::String => "string",
            TypeTag::Bytes => "bytes",
            TypeTag::OrderedList => "list",
            TypeTag::KeyedMap => "map",
            TypeTag::ArchivableObject => "object",
        }
    }

    /// Whether values of this kind are stored through the structured archive
    /// rather than a fixed scalar encoding.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            TypeTag::OrderedList | TypeTag::KeyedMap | TypeTag::ArchivableObject
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
