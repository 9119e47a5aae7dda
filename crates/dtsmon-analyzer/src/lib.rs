//! Run loop, record sinks, and byte monitors.
//!
//! This is the top library layer. An [`Analyzer`] pulls frames from a
//! [`ByteSource`](dtsmon_transport::ByteSource), checks and decodes them
//! against a [`Schema`](dtsmon_schema::Schema), and hands each record to its
//! sinks. A [`Monitor`] shows the same stream without any framing.

pub mod error;
pub mod hexdump;
pub mod monitor;
pub mod options;
pub mod run;
pub mod sink;

pub use error::{AnalyzerError, Result};
pub use hexdump::Hexdump;
pub use monitor::{Monitor, MonitorMode};
pub use options::{AnalyzerOptions, FrameNumber, LineTerminator, RecordStyle};
pub use run::{Analyzer, Outcome, Pipeline};
pub use sink::{FileSink, Palette, Sink, TerminalSink};
