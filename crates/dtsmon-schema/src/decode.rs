use std::fmt;
use std::sync::Arc;

use bytes::Buf;
use dtsmon_frame::Frame;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::DecodeError;
use crate::layout::{Endianness, FieldType, Schema};

/// A decoded field value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps the fractional part on whole floats ("1.0").
        match self {
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v:?}"),
            Value::F64(v) => write!(f, "{v:?}"),
        }
    }
}

/// The labelled values carried by one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// Sequence number of the frame this record came from.
    pub sequence: u64,
    /// One entry per value field, in layout order.
    pub fields: Vec<(Arc<str>, Value)>,
}

impl DecodedRecord {
    /// Look up a value by label. Returns the first match.
    pub fn get(&self, label: &str) -> Option<Value> {
        self.fields
            .iter()
            .find(|(name, _)| name.as_ref() == label)
            .map(|(_, value)| *value)
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.fields.iter().map(|(_, value)| *value)
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("DecodedRecord", 2)?;
        record.serialize_field("frame", &self.sequence)?;
        record.serialize_field("fields", &FieldMap(&self.fields))?;
        record.end()
    }
}

struct FieldMap<'a>(&'a [(Arc<str>, Value)]);

impl Serialize for FieldMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in self.0 {
            map.serialize_entry(label.as_ref(), value)?;
        }
        map.end()
    }
}

/// Unpack a frame payload into labelled values.
///
/// Fields are read in declared order using the schema's byte order. Padding
/// bytes are skipped and produce no entry.
pub fn decode(frame: &Frame, schema: &Schema) -> Result<DecodedRecord, DecodeError> {
    if frame.payload.len() != schema.payload_size() {
        return Err(DecodeError::LengthMismatch {
            expected: schema.payload_size(),
            actual: frame.payload.len(),
        });
    }

    let mut buf = frame.payload.clone();
    let little = schema.endianness() == Endianness::Little;
    let mut fields = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let value = match (field.kind, little) {
            (FieldType::Padding, _) => {
                buf.advance(1);
                continue;
            }
            (FieldType::SInt16, false) => Value::I16(buf.get_i16()),
            (FieldType::SInt16, true) => Value::I16(buf.get_i16_le()),
            (FieldType::UInt16, false) => Value::U16(buf.get_u16()),
            (FieldType::UInt16, true) => Value::U16(buf.get_u16_le()),
            (FieldType::SInt32, false) => Value::I32(buf.get_i32()),
            (FieldType::SInt32, true) => Value::I32(buf.get_i32_le()),
            (FieldType::UInt32, false) => Value::U32(buf.get_u32()),
            (FieldType::UInt32, true) => Value::U32(buf.get_u32_le()),
            (FieldType::SInt64, false) => Value::I64(buf.get_i64()),
            (FieldType::SInt64, true) => Value::I64(buf.get_i64_le()),
            (FieldType::UInt64, false) => Value::U64(buf.get_u64()),
            (FieldType::UInt64, true) => Value::U64(buf.get_u64_le()),
            (FieldType::Float32, false) => Value::F32(buf.get_f32()),
            (FieldType::Float32, true) => Value::F32(buf.get_f32_le()),
            (FieldType::Float64, false) => Value::F64(buf.get_f64()),
            (FieldType::Float64, true) => Value::F64(buf.get_f64_le()),
        };
        fields.push((Arc::clone(&field.label), value));
    }

    Ok(DecodedRecord {
        sequence: frame.sequence,
        fields,
    })
}
