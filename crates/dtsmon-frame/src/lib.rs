//! Marker-synchronized fixed-size framing for unframed serial streams.
//!
//! This is the core value-add layer of dtsmon. The link delivers frames as:
//! - A 4-byte start marker (`73 95 DB 42`) for stream synchronization
//! - A fixed-size payload whose length comes from the loaded layout
//! - An optional 1-byte checksum trailer
//!
//! There is no length field: every frame is found by hunting the marker,
//! and the payload is consumed by count, whatever its content.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;

pub use checksum::{
    checksum, frame_checksum, ChecksumCoverage, IntegrityChecker, IntegrityConfig, Verdict,
    DEFAULT_FAILURE_LIMIT,
};
pub use codec::{encode_frame, Assembler, Frame, FrameConfig, SyncState, Synchronizer, MARKER};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
