//! Consumers of decoded records.

mod file;
mod terminal;

pub use file::{FileSink, SESSION_RULE_WIDTH};
pub use terminal::{Palette, TerminalSink, VALUE_WIDTH};

use dtsmon_schema::DecodedRecord;

use crate::error::Result;

/// Receives each decoded record in dispatch order.
pub trait Sink {
    fn write_record(&mut self, record: &DecodedRecord) -> Result<()>;

    /// Push buffered output to its destination.
    fn flush(&mut self) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write_record(&mut self, record: &DecodedRecord) -> Result<()> {
        (**self).write_record(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
