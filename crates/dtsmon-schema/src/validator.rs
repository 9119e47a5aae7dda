use serde_json::Value;

use crate::error::{Result, SchemaError};

/// Structure every layout descriptor must have.
///
/// Only the shape is checked here; type tags and sizes are checked while
/// building the [`Schema`](crate::Schema).
const DESCRIPTOR_SHAPE: &str = r#"{
    "type": "object",
    "properties": {
        "endianness": { "type": "string" },
        "items": {
            "type": "array",
            "items": {
                "type": "object",
                "minProperties": 1,
                "maxProperties": 1,
                "additionalProperties": { "type": "string" }
            }
        }
    },
    "required": ["endianness", "items"],
    "additionalProperties": false
}"#;

/// Older descriptors spell the byte order key this way.
const LEGACY_ENDIANNESS_KEY: &str = "endianess";

/// Rename legacy keys so the descriptor matches [`DESCRIPTOR_SHAPE`].
pub(crate) fn normalize_descriptor(descriptor: &mut Value) {
    if let Value::Object(map) = descriptor {
        if !map.contains_key("endianness") {
            if let Some(value) = map.remove(LEGACY_ENDIANNESS_KEY) {
                map.insert("endianness".to_string(), value);
            }
        }
    }
}

pub(crate) fn validate_descriptor_shape(descriptor: &Value) -> Result<()> {
    let shape: Value = serde_json::from_str(DESCRIPTOR_SHAPE)?;
    let validator = jsonschema::validator_for(&shape)
        .map_err(|err| SchemaError::InvalidShape(format!("descriptor shape: {err}")))?;

    let mut errors = validator.iter_errors(descriptor);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(3) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::InvalidShape(message));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_well_formed_descriptor() {
        let descriptor = json!({
            "endianness": "little",
            "items": [{ "seq": "uInt16" }, { "": "byte" }]
        });
        assert!(validate_descriptor_shape(&descriptor).is_ok());
    }

    #[test]
    fn rejects_extra_top_level_key() {
        let descriptor = json!({
            "endianness": "big",
            "items": [],
            "version": 2
        });
        assert!(matches!(
            validate_descriptor_shape(&descriptor),
            Err(SchemaError::InvalidShape(_))
        ));
    }

    #[test]
    fn rejects_missing_items() {
        let descriptor = json!({ "endianness": "big" });
        assert!(validate_descriptor_shape(&descriptor).is_err());
    }

    #[test]
    fn rejects_multi_key_item() {
        let descriptor = json!({
            "endianness": "big",
            "items": [{ "a": "uInt16", "b": "uInt16" }]
        });
        assert!(validate_descriptor_shape(&descriptor).is_err());
    }

    #[test]
    fn rejects_non_string_type() {
        let descriptor = json!({
            "endianness": "big",
            "items": [{ "a": 16 }]
        });
        assert!(validate_descriptor_shape(&descriptor).is_err());
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(validate_descriptor_shape(&json!(["endianness", "items"])).is_err());
    }

    #[test]
    fn legacy_key_is_renamed() {
        let mut descriptor = json!({ "endianess": "L", "items": [] });
        normalize_descriptor(&mut descriptor);

        assert_eq!(descriptor["endianness"], "L");
        assert!(descriptor.get("endianess").is_none());
        assert!(validate_descriptor_shape(&descriptor).is_ok());
    }

    #[test]
    fn both_keys_keep_legacy_for_rejection() {
        let mut descriptor = json!({ "endianness": "big", "endianess": "L", "items": [] });
        normalize_descriptor(&mut descriptor);
        assert!(validate_descriptor_shape(&descriptor).is_err());
    }
}
