//! Frame synchronization and schema-driven decoding for serial telemetry streams.
//!
//! dtsmon finds fixed-size frames in an unframed byte stream, checks their
//! trailing checksum, and decodes each payload according to a JSON layout
//! descriptor.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte sources (serial devices, replayed captures)
//! - [`frame`]: marker synchronization, frame assembly, integrity checking
//! - [`schema`]: layout descriptors and payload decoding
//! - [`analyzer`]: run loop, record sinks, byte monitors

/// Re-export transport types.
pub mod transport {
    pub use dtsmon_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use dtsmon_frame::*;
}

/// Re-export schema types.
pub mod schema {
    pub use dtsmon_schema::*;
}

/// Re-export analyzer types.
pub mod analyzer {
    pub use dtsmon_analyzer::*;
}
