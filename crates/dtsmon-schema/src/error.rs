/// Errors that can occur while loading a layout descriptor.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The descriptor file could not be read.
    #[error("failed to load layout descriptor: {0}")]
    LoadFailed(String),

    /// The descriptor is not valid JSON.
    #[error("layout descriptor is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The descriptor does not have the expected structure.
    #[error("invalid layout descriptor: {0}")]
    InvalidShape(String),

    /// The byte order tag is not recognized.
    #[error("unrecognized endianness '{0}' (expected big or little)")]
    UnknownEndianness(String),

    /// A field's type tag is not recognized.
    #[error("unrecognized type '{tag}' for item '{label}'")]
    UnknownType { label: String, tag: String },

    /// The payload size must be even.
    #[error("payload size is not even ({0} bytes)")]
    OddPayloadSize(usize),

    /// The descriptor declares no items.
    #[error("layout descriptor declares no items")]
    EmptyLayout,
}

/// Errors that can occur while decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame does not match the layout's payload size.
    #[error("got {actual} payload bytes instead of {expected}; check the layout descriptor and/or firmware")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
