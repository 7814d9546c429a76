//! Versioned, self-describing archive for structured values.
//!
//! ```text
//! archive := "FATR" | version u8 | value
//! value   := tag u8 | payload
//! ```
//!
//! Scalars are little-endian and fixed width, strings/bytes/objects carry a
//! `u32` length, lists and maps a `u32` count. Map entries are written in key
//! order. Objects are JSON text.

use std::collections::BTreeMap;

use crate::error::CodecError;
use crate::time::{from_micros, to_micros};
use crate::value::Value;

pub const ARCHIVE_MAGIC: &[u8; 4] = b"FATR";
pub const ARCHIVE_VERSION: u8 = 1;

/// Containers nested deeper than this are rejected on decode.
pub const MAX_DEPTH: usize = 64;

const TAG_INTEGER: u8 = 0x01;
const TAG_FLOAT32: u8 = 0x02;
const TAG_FLOAT64: u8 = 0x03;
const TAG_BOOLEAN: u8 = 0x04;
const TAG_DATE: u8 = 0x05;
const TAG_STRING: u8 = 0x06;
const TAG_BYTES: u8 = 0x07;
const TAG_LIST: u8 = 0x08;
const TAG_MAP: u8 = 0x09;
const TAG_OBJECT: u8 = 0x0a;

/// Encode a value with the archive header.
pub fn to_archive(value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ArchiveEncoder::new();
    encoder.buffer.extend_from_slice(ARCHIVE_MAGIC);
    encoder.buffer.push(ARCHIVE_VERSION);
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Decode a complete archive. Trailing bytes are an error.
pub fn from_archive(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut decoder = ArchiveDecoder::new(bytes);
    let magic = decoder.read_bytes(ARCHIVE_MAGIC.len())?;
    if magic != ARCHIVE_MAGIC {
        return Err(CodecError::InvalidMagic);
    }
    let version = decoder.read_byte()?;
    if version != ARCHIVE_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let value = decoder.decode(0)?;
    let remaining = decoder.remaining();
    if remaining > 0 {
        return Err(CodecError::TrailingBytes(remaining));
    }
    Ok(value)
}

struct ArchiveEncoder {
    buffer: Vec<u8>,
}

impl ArchiveEncoder {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn encode(&mut self, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Integer(n) => {
                self.buffer.push(TAG_INTEGER);
                self.buffer.extend_from_slice(&n.to_le_bytes());
            }
            Value::Float32(n) => {
                self.buffer.push(TAG_FLOAT32);
                self.buffer.extend_from_slice(&n.to_le_bytes());
            }
            Value::Float64(n) => {
                self.buffer.push(TAG_FLOAT64);
                self.buffer.extend_from_slice(&n.to_le_bytes());
            }
            Value::Boolean(b) => {
                self.buffer.push(TAG_BOOLEAN);
                self.buffer.push(u8::from(*b));
            }
            Value::Date(dt) => {
                self.buffer.push(TAG_DATE);
                self.buffer.extend_from_slice(&to_micros(dt).to_le_bytes());
            }
            Value::String(s) => {
                self.buffer.push(TAG_STRING);
                self.encode_len_prefixed(s.as_bytes())?;
            }
            Value::Bytes(bytes) => {
                self.buffer.push(TAG_BYTES);
                self.encode_len_prefixed(bytes)?;
            }
            Value::List(items) => {
                self.buffer.push(TAG_LIST);
                self.encode_len(items.len())?;
                for item in items {
                    self.encode(item)?;
                }
            }
            Value::Map(map) => {
                self.buffer.push(TAG_MAP);
                self.encode_len(map.len())?;
                for (key, item) in map {
                    self.encode_len_prefixed(key.as_bytes())?;
                    self.encode(item)?;
                }
            }
            Value::Object(json) => {
                self.buffer.push(TAG_OBJECT);
                let text = serde_json::to_vec(json)?;
                self.encode_len_prefixed(&text)?;
            }
        }
        Ok(())
    }

    fn encode_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = u32::try_from(len).map_err(|_| CodecError::TooLong(len))?;
        self.buffer.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn encode_len_prefixed(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.encode_len(bytes.len())?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }
}

struct ArchiveDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ArchiveDecoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_byte(&mut self) -> Result<u8, CodecError> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_len(&mut self) -> Result<usize, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?) as usize)
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    fn decode(&mut self, depth: usize) -> Result<Value, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::TooDeep(MAX_DEPTH));
        }

        let tag = self.read_byte()?;
        let value = match tag {
            TAG_INTEGER => Value::Integer(i64::from_le_bytes(self.read_array()?)),
            TAG_FLOAT32 => Value::Float32(f32::from_le_bytes(self.read_array()?)),
            TAG_FLOAT64 => Value::Float64(f64::from_le_bytes(self.read_array()?)),
            TAG_BOOLEAN => Value::Boolean(self.read_byte()? != 0),
            TAG_DATE => {
                let micros = i64::from_le_bytes(self.read_array()?);
                Value::Date(from_micros(micros).ok_or(CodecError::DateOutOfRange(micros))?)
            }
            TAG_STRING => Value::String(self.read_string()?),
            TAG_BYTES => {
                let len = self.read_len()?;
                Value::Bytes(self.read_bytes(len)?.to_vec())
            }
            TAG_LIST => {
                let count = self.read_len()?;
                // Every element takes at least two bytes, cap the allocation.
                let mut items = Vec::with_capacity(count.min(self.remaining() / 2));
                for _ in 0..count {
                    items.push(self.decode(depth + 1)?);
                }
                Value::List(items)
            }
            TAG_MAP => {
                let count = self.read_len()?;
                let mut map = BTreeMap::new();
                for _ in 0..count {
                    let key = self.read_string()?;
                    // Keys are written in ascending order, exactly once.
                    if map.last_key_value().is_some_and(|(last, _)| *last >= key) {
                        return Err(CodecError::UnorderedKey(key));
                    }
                    let item = self.decode(depth + 1)?;
                    map.insert(key, item);
                }
                Value::Map(map)
            }
            TAG_OBJECT => {
                let len = self.read_len()?;
                let text = self.read_bytes(len)?;
                Value::Object(serde_json::from_slice(text)?)
            }
            other => return Err(CodecError::UnknownTag(other)),
        };
        Ok(value)
    }
}
