//! Byte source abstraction for unframed serial links.
//!
//! Provides a unified interface over the places a telemetry stream can come from:
//! - A serial device (RS485 adapters, USB CDC ports)
//! - Any `Read` stream, e.g. a capture file being replayed
//!
//! This is the lowest layer of dtsmon. Everything else builds on top of
//! the [`ByteSource`] trait provided here.

pub mod error;
pub mod serial;
pub mod settings;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{available_ports, PortInfo, SerialSource};
pub use settings::{
    DataBits, Parity, SerialSettings, StopBits, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT,
};
pub use stream::StreamSource;
pub use traits::ByteSource;
