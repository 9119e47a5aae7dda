use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::error::{Result, SchemaError};
use crate::validator::{normalize_descriptor, validate_descriptor_shape};

/// Byte order of every multi-byte field in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Parse a descriptor tag. `B` and `L` are accepted for older descriptors.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "big" | "B" => Some(Self::Big),
            "little" | "L" => Some(Self::Little),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Endianness::Big => "big",
            Endianness::Little => "little",
        }
    }
}

/// Numeric kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    SInt64,
    UInt64,
    Float32,
    Float64,
    /// One byte that occupies space but produces no value.
    Padding,
}

impl FieldType {
    /// Parse a descriptor type tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sInt16" => Some(Self::SInt16),
            "uInt16" => Some(Self::UInt16),
            "sInt32" => Some(Self::SInt32),
            "uInt32" => Some(Self::UInt32),
            "sInt64" => Some(Self::SInt64),
            "uInt64" => Some(Self::UInt64),
            "float" => Some(Self::Float32),
            "double" => Some(Self::Float64),
            "byte" => Some(Self::Padding),
            _ => None,
        }
    }

    /// The descriptor tag for this type.
    pub fn tag(self) -> &'static str {
        match self {
            FieldType::SInt16 => "sInt16",
            FieldType::UInt16 => "uInt16",
            FieldType::SInt32 => "sInt32",
            FieldType::UInt32 => "uInt32",
            FieldType::SInt64 => "sInt64",
            FieldType::UInt64 => "uInt64",
            FieldType::Float32 => "float",
            FieldType::Float64 => "double",
            FieldType::Padding => "byte",
        }
    }

    /// Bytes occupied in the payload.
    pub fn width(self) -> usize {
        match self {
            FieldType::Padding => 1,
            FieldType::SInt16 | FieldType::UInt16 => 2,
            FieldType::SInt32 | FieldType::UInt32 | FieldType::Float32 => 4,
            FieldType::SInt64 | FieldType::UInt64 | FieldType::Float64 => 8,
        }
    }

    pub fn is_padding(self) -> bool {
        self == FieldType::Padding
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One entry of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Output label. Empty for padding.
    pub label: Arc<str>,
    pub kind: FieldType,
}

impl FieldSpec {
    pub fn new(label: &str, kind: FieldType) -> Self {
        Self {
            label: Arc::from(label),
            kind,
        }
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }
}

/// A validated frame layout.
///
/// Built once from a descriptor and immutable afterwards; everything
/// downstream treats it as an already-checked contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    endianness: Endianness,
    fields: Vec<FieldSpec>,
    payload_size: usize,
}

impl Schema {
    /// Build a schema from already-parsed fields with the default config.
    pub fn new(endianness: Endianness, fields: Vec<FieldSpec>) -> Result<Self> {
        Self::with_config(endianness, fields, LayoutConfig::default())
    }

    /// Build a schema from already-parsed fields.
    pub fn with_config(
        endianness: Endianness,
        fields: Vec<FieldSpec>,
        config: LayoutConfig,
    ) -> Result<Self> {
        if fields.is_empty() {
            return Err(SchemaError::EmptyLayout);
        }

        let payload_size: usize = fields.iter().map(FieldSpec::width).sum();
        if payload_size % 2 != 0 {
            if config.require_even_payload {
                return Err(SchemaError::OddPayloadSize(payload_size));
            }
            warn!(payload_size, "odd payload size accepted");
        }

        if fields.iter().all(|field| field.kind.is_padding()) {
            warn!("layout has no value fields; decoded records will be empty");
        }

        Ok(Self {
            endianness,
            fields,
            payload_size,
        })
    }

    /// Load from a descriptor JSON string.
    pub fn from_json_str(descriptor: &str) -> Result<Self> {
        Self::from_json_str_with_config(descriptor, LayoutConfig::default())
    }

    /// Load from a descriptor JSON string with explicit config.
    pub fn from_json_str_with_config(descriptor: &str, config: LayoutConfig) -> Result<Self> {
        let value: Value = serde_json::from_str(descriptor)?;
        Self::from_value_with_config(value, config)
    }

    /// Load from a parsed descriptor.
    pub fn from_value_with_config(mut descriptor: Value, config: LayoutConfig) -> Result<Self> {
        normalize_descriptor(&mut descriptor);
        validate_descriptor_shape(&descriptor)?;

        let endianness_tag = descriptor["endianness"].as_str().unwrap_or_default();
        let endianness = Endianness::from_tag(endianness_tag)
            .ok_or_else(|| SchemaError::UnknownEndianness(endianness_tag.to_string()))?;

        let items = descriptor["items"].as_array().map(Vec::as_slice).unwrap_or_default();
        let mut fields = Vec::with_capacity(items.len());
        for item in items {
            let Some((label, tag)) = single_entry(item) else {
                return Err(SchemaError::InvalidShape(format!(
                    "item is not a single label/type pair: {item}"
                )));
            };
            let kind = FieldType::from_tag(tag).ok_or_else(|| SchemaError::UnknownType {
                label: label.to_string(),
                tag: tag.to_string(),
            })?;
            if kind.is_padding() && !label.is_empty() {
                debug!(label, "label on padding byte is ignored");
            }
            fields.push(FieldSpec::new(label, kind));
        }

        Self::with_config(endianness, fields, config)
    }

    /// Load a descriptor file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_config(path, LayoutConfig::default())
    }

    /// Load a descriptor file with explicit config.
    pub fn from_path_with_config(path: impl AsRef<Path>, config: LayoutConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        let max_bytes = config.max_descriptor_size;
        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > max_bytes {
            return Err(SchemaError::LoadFailed(format!(
                "descriptor larger than {max_bytes} bytes: {}",
                path.display()
            )));
        }

        let schema = Self::from_json_str_with_config(&content, config)?;
        debug!(
            path = %path.display(),
            payload_size = schema.payload_size,
            fields = schema.fields.len(),
            "layout descriptor loaded"
        );
        Ok(schema)
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// All fields in declared order, padding included.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Sum of all field widths.
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// Labels of value-producing fields, in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.value_fields().map(|field| field.label.as_ref())
    }

    /// Fields that produce a value, in order.
    pub fn value_fields(&self) -> impl Iterator<Item = &FieldSpec> + '_ {
        self.fields.iter().filter(|field| !field.kind.is_padding())
    }

    /// Byte offset of each field within the payload.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, &FieldSpec)> + '_ {
        self.fields.iter().scan(0usize, |offset, field| {
            let start = *offset;
            *offset += field.width();
            Some((start, field))
        })
    }
}

fn single_entry(item: &Value) -> Option<(&str, &str)> {
    let map = item.as_object()?;
    if map.len() != 1 {
        return None;
    }
    let (label, tag) = map.iter().next()?;
    Some((label.as_str(), tag.as_str()?))
}
