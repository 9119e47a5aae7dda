/// Errors that can occur on a byte source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("could not open serial device {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// The device rejected a line setting or a buffer operation.
    #[error("serial device configuration failed: {0}")]
    Configure(#[source] serialport::Error),

    /// Serial ports could not be enumerated.
    #[error("failed to list serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    /// A line setting is out of range.
    #[error("invalid serial setting: {0}")]
    InvalidSetting(String),

    /// An I/O error occurred while reading the source.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source has no more bytes to deliver (end of a replayed capture).
    #[error("byte source closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
