//! Typed marshalling between [`Value`]s and attribute bytes.
//!
//! Scalar tags use a bare fixed-width little-endian encoding with no header.
//! `String` is raw UTF-8 and `Bytes` is stored as-is. The structured tags go
//! through the [`archive`](crate::archive) format.

use crate::TypeTag;
use crate::archive::{from_archive, to_archive};
use crate::error::CodecError;
use crate::time::{from_micros, to_micros};
use crate::value::Value;

/// Serialize `value` as a `tag` property.
///
/// `ArchivableObject` accepts any value (it is archived whole); every other
/// tag requires the matching variant.
pub fn encode(tag: TypeTag, value: &Value) -> Result<Vec<u8>, CodecError> {
    if tag != TypeTag::ArchivableObject && value.tag() != tag {
        return Err(CodecError::TypeMismatch {
            expected: tag,
            actual: value.tag(),
        });
    }

    let bytes = match value {
        _ if tag.is_structured() => to_archive(value)?,
        Value::Integer(n) => n.to_le_bytes().to_vec(),
        Value::Float32(n) => n.to_le_bytes().to_vec(),
        Value::Float64(n) => n.to_le_bytes().to_vec(),
        Value::Boolean(b) => vec![u8::from(*b)],
        Value::Date(dt) => to_micros(dt).to_le_bytes().to_vec(),
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Bytes(bytes) => bytes.clone(),
        // Structured variants only pair with structured tags.
        Value::List(_) | Value::Map(_) | Value::Object(_) => to_archive(value)?,
    };
    Ok(bytes)
}

/// Deserialize bytes stored under a `tag` property.
pub fn decode(tag: TypeTag, bytes: &[u8]) -> Result<Value, CodecError> {
    let value = match tag {
        TypeTag::Integer => Value::Integer(i64::from_le_bytes(fixed(tag, bytes)?)),
        TypeTag::Float32 => Value::Float32(f32::from_le_bytes(fixed(tag, bytes)?)),
        TypeTag::Float64 => Value::Float64(f64::from_le_bytes(fixed(tag, bytes)?)),
        TypeTag::Boolean => {
            let [byte] = fixed::<1>(tag, bytes)?;
            Value::Boolean(byte != 0)
        }
        TypeTag::Date => {
            let micros = i64::from_le_bytes(fixed(tag, bytes)?);
            Value::Date(from_micros(micros).ok_or(CodecError::DateOutOfRange(micros))?)
        }
        TypeTag::String => Value::String(
            String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)?,
        ),
        TypeTag::Bytes => Value::Bytes(bytes.to_vec()),
        TypeTag::OrderedList | TypeTag::KeyedMap => {
            let value = from_archive(bytes)?;
            if value.tag() != tag {
                return Err(CodecError::TypeMismatch {
                    expected: tag,
                    actual: value.tag(),
                });
            }
            value
        }
        TypeTag::ArchivableObject => from_archive(bytes)?,
    };
    Ok(value)
}

fn fixed<const N: usize>(tag: TypeTag, bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes.try_into().map_err(|_| CodecError::InvalidWidth {
        tag,
        expected: N,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn roundtrip(tag: TypeTag, value: Value) {
        let bytes = encode(tag, &value).unwrap();
        assert_eq!(decode(tag, &bytes).unwrap(), value, "tag {tag}");
    }

    #[test]
    fn every_tag_roundtrips() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::Integer(1));
        map.insert("b".to_string(), Value::String("two".into()));

        roundtrip(TypeTag::Integer, Value::Integer(-42));
        roundtrip(TypeTag::Float32, Value::Float32(3.25));
        roundtrip(TypeTag::Float64, Value::Float64(-0.125));
        roundtrip(TypeTag::Boolean, Value::Boolean(true));
        roundtrip(
            TypeTag::Date,
            Value::Date(Utc.with_ymd_and_hms(2021, 5, 23, 8, 30, 0).unwrap()),
        );
        roundtrip(TypeTag::String, Value::String("héllo".into()));
        roundtrip(TypeTag::Bytes, Value::Bytes(vec![0, 1, 2, 255]));
        roundtrip(
            TypeTag::OrderedList,
            Value::List(vec![Value::Integer(1), Value::String("x".into())]),
        );
        roundtrip(TypeTag::KeyedMap, Value::Map(map));
        roundtrip(
            TypeTag::ArchivableObject,
            Value::Object(serde_json::json!({"red": 0.5})),
        );
    }

    #[test]
    fn scalars_have_no_header() {
        assert_eq!(encode(TypeTag::Boolean, &Value::Boolean(true)).unwrap(), vec![1]);
        assert_eq!(
            encode(TypeTag::Integer, &Value::Integer(1)).unwrap(),
            vec![1, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            encode(TypeTag::String, &Value::String("abc".into())).unwrap(),
            b"abc".to_vec()
        );
    }

    #[test]
    fn encode_rejects_mismatched_variant() {
        let err = encode(TypeTag::Integer, &Value::String("1".into())).unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                expected: TypeTag::Integer,
                actual: TypeTag::String
            }
        );
    }

    #[test]
    fn archivable_object_accepts_any_variant() {
        roundtrip(TypeTag::ArchivableObject, Value::Integer(7));
        roundtrip(
            TypeTag::ArchivableObject,
            Value::List(vec![Value::Boolean(false)]),
        );
    }

    #[test]
    fn decode_rejects_wrong_width() {
        assert_eq!(
            decode(TypeTag::Integer, &[1, 2, 3]),
            Err(CodecError::InvalidWidth {
                tag: TypeTag::Integer,
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn decode_rejects_list_stored_as_map() {
        let bytes = encode(TypeTag::OrderedList, &Value::List(vec![])).unwrap();
        assert!(matches!(
            decode(TypeTag::KeyedMap, &bytes),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn decode_rejects_garbage_for_structured_tags() {
        assert!(decode(TypeTag::OrderedList, b"not an archive").is_err());
        assert!(decode(TypeTag::ArchivableObject, &[]).is_err());
    }
}
