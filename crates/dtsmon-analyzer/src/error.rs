use dtsmon_frame::FrameError;
use dtsmon_schema::{DecodeError, SchemaError};
use dtsmon_transport::TransportError;

/// Errors that end an analyzer or monitor run.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// The options are inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The layout descriptor could not be loaded.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Too many consecutive checksum failures.
    #[error("{failures} consecutive checksum failures; check the layout descriptor and/or firmware")]
    Integrity { failures: u32 },

    /// A frame did not match the layout.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A sink could not be opened or written.
    #[error("{context}: {source}")]
    Sink {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    pub(crate) fn sink(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Sink {
            context: context.into(),
            source,
        }
    }
}

impl From<FrameError> for AnalyzerError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Transport(err) => Self::Transport(err),
            FrameError::Integrity { failures } => Self::Integrity { failures },
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
