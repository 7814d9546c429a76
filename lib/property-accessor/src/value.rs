use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::TypeTag;
use crate::time::{system_time_to_utc, truncate_micros};

/// A decoded property value.
///
/// Each variant corresponds to exactly one [`TypeTag`]. Lists and maps nest
/// arbitrarily; `Object` carries an archived object graph as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float32(f32),
    Float64(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(serde_json::Value),
}

impl Value {
    /// The tag this value would be stored under.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Integer(_) => TypeTag::Integer,
            Value::Float32(_) => TypeTag::Float32,
            Value::Float64(_) => TypeTag::Float64,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Date(_) => TypeTag::Date,
            Value::String(_) => TypeTag::String,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::List(_) => TypeTag::OrderedList,
            Value::Map(_) => TypeTag::KeyedMap,
            Value::Object(_) => TypeTag::ArchivableObject,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float32(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float64(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Date(truncate_micros(dt))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Object(json)
    }
}

/// Rust types that can back a property field.
///
/// The associated [`TAG`](PropertyValue::TAG) is how the `#[properties]`
/// macro classifies a field; a field whose type does not implement this
/// trait fails to compile. `from_value` returns `None` when the stored
/// value has the wrong shape or does not fit the target type.
pub trait PropertyValue: Sized {
    const TAG: TypeTag;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! integer_property {
    ($($ty:ty),*) => {
        $(
            impl PropertyValue for $ty {
                const TAG: TypeTag = TypeTag::Integer;

                fn into_value(self) -> Value {
                    Value::Integer(i64::from(self))
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Integer(n) => <$ty>::try_from(n).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_property!(i8, i16, i32, i64, u8, u16, u32);

// Unsigned 64-bit values are stored bit-for-bit so the full range survives.
impl PropertyValue for u64 {
    const TAG: TypeTag = TypeTag::Integer;

    fn into_value(self) -> Value {
        Value::Integer(self as i64)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(n as u64),
            _ => None,
        }
    }
}

impl PropertyValue for usize {
    const TAG: TypeTag = TypeTag::Integer;

    fn into_value(self) -> Value {
        (self as u64).into_value()
    }

    fn from_value(value: Value) -> Option<Self> {
        u64::from_value(value).and_then(|n| usize::try_from(n).ok())
    }
}

impl PropertyValue for isize {
    const TAG: TypeTag = TypeTag::Integer;

    fn into_value(self) -> Value {
        Value::Integer(self as i64)
    }

    fn from_value(value: Value) -> Option<Self> {
        i64::from_value(value).and_then(|n| isize::try_from(n).ok())
    }
}

impl PropertyValue for f32 {
    const TAG: TypeTag = TypeTag::Float32;

    fn into_value(self) -> Value {
        Value::Float32(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float32(n) => Some(n),
            _ => None,
        }
    }
}

impl PropertyValue for f64 {
    const TAG: TypeTag = TypeTag::Float64;

    fn into_value(self) -> Value {
        Value::Float64(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float64(n) => Some(n),
            _ => None,
        }
    }
}

impl PropertyValue for bool {
    const TAG: TypeTag = TypeTag::Boolean;

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl PropertyValue for String {
    const TAG: TypeTag = TypeTag::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PropertyValue for Vec<u8> {
    const TAG: TypeTag = TypeTag::Bytes;

    fn into_value(self) -> Value {
        Value::Bytes(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl PropertyValue for DateTime<Utc> {
    const TAG: TypeTag = TypeTag::Date;

    fn into_value(self) -> Value {
        Value::Date(truncate_micros(self))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }
}

impl PropertyValue for SystemTime {
    const TAG: TypeTag = TypeTag::Date;

    fn into_value(self) -> Value {
        Value::Date(system_time_to_utc(self))
    }

    fn from_value(value: Value) -> Option<Self> {
        DateTime::<Utc>::from_value(value).map(SystemTime::from)
    }
}

impl PropertyValue for Vec<Value> {
    const TAG: TypeTag = TypeTag::OrderedList;

    fn into_value(self) -> Value {
        Value::List(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl PropertyValue for BTreeMap<String, Value> {
    const TAG: TypeTag = TypeTag::KeyedMap;

    fn into_value(self) -> Value {
        Value::Map(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl PropertyValue for HashMap<String, Value> {
    const TAG: TypeTag = TypeTag::KeyedMap;

    fn into_value(self) -> Value {
        Value::Map(self.into_iter().collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        BTreeMap::<String, Value>::from_value(value).map(|map| map.into_iter().collect())
    }
}

impl PropertyValue for serde_json::Value {
    const TAG: TypeTag = TypeTag::ArchivableObject;

    fn into_value(self) -> Value {
        Value::Object(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(json) => Some(json),
            _ => None,
        }
    }
}

/// Archive any serializable object graph as an [`Value::Object`].
///
/// Returns `None` when serde refuses the value (e.g. a map with non-string
/// keys); generated setters skip the write in that case.
pub fn archive_object<T: Serialize>(object: &T) -> Option<Value> {
    serde_json::to_value(object).ok().map(Value::Object)
}

/// Rebuild an object archived with [`archive_object`].
pub fn unarchive_object<T: DeserializeOwned>(value: Value) -> Option<T> {
    match value {
        Value::Object(json) => serde_json::from_value(json).ok(),
        _ => None,
    }
}
