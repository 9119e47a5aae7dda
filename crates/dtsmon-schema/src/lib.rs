//! Layout descriptors and schema-driven frame decoding.
//!
//! A layout descriptor is a small JSON document naming the byte order and
//! an ordered list of typed fields. It is validated once at startup into a
//! [`Schema`], which then drives decoding of every frame payload into a
//! [`DecodedRecord`].

pub mod config;
pub mod decode;
pub mod error;
pub mod layout;
pub mod validator;

pub use config::LayoutConfig;
pub use decode::{decode, DecodedRecord, Value};
pub use error::{DecodeError, Result, SchemaError};
pub use layout::{Endianness, FieldSpec, FieldType, Schema};
