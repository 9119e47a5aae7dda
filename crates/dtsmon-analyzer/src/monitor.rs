use std::fmt::Write as _;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use dtsmon_transport::{ByteSource, TransportError};
use tracing::{debug, info};

use crate::error::{AnalyzerError, Result};
use crate::hexdump::Hexdump;
use crate::run::Outcome;

/// How a byte monitor renders what it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorMode {
    /// Bytes are written out unchanged.
    #[default]
    Passthrough,
    /// Canonical 16-byte hex dump lines.
    Hexdump,
    /// Two hex digits per byte, `:` after each read.
    RawHex,
}

impl MonitorMode {
    /// Bytes requested per read.
    pub fn read_size(self) -> usize {
        match self {
            MonitorMode::RawHex => 2,
            MonitorMode::Passthrough | MonitorMode::Hexdump => 256,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MonitorMode::Passthrough => "normal",
            MonitorMode::Hexdump => "hexdump",
            MonitorMode::RawHex => "raw",
        }
    }
}

/// Copies a byte source to a writer without any framing.
pub struct Monitor<S, W> {
    source: S,
    out: W,
    mode: MonitorMode,
    single_shot: u64,
    hexdump: Hexdump,
    reads: u64,
}

impl<S: ByteSource, W: Write> Monitor<S, W> {
    pub fn new(source: S, out: W, mode: MonitorMode) -> Self {
        Self {
            source,
            out,
            mode,
            single_shot: 0,
            hexdump: Hexdump::new(),
            reads: 0,
        }
    }

    /// Stop after `count` reads that returned data. 0 = unbounded.
    pub fn with_single_shot(mut self, count: u64) -> Self {
        self.single_shot = count;
        self
    }

    pub fn mode(&self) -> MonitorMode {
        self.mode
    }

    /// Reads that returned at least one byte so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Run until shutdown, the single-shot count, end of input, or an error.
    ///
    /// The writer is flushed and the source drained on every exit path.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<Outcome> {
        info!(
            source = %self.source.describe(),
            mode = self.mode.name(),
            "monitor started"
        );

        let result = self.run_inner(shutdown);
        let closed = self.close();
        let outcome = result?;
        closed?;

        info!(%outcome, reads = self.reads, "monitor stopped");
        Ok(outcome)
    }

    fn run_inner(&mut self, shutdown: &AtomicBool) -> Result<Outcome> {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                return Ok(Outcome::ShutDown);
            }

            match self.step() {
                Ok(0) => {}
                Ok(_) => {
                    self.reads += 1;
                    if self.single_shot > 0 && self.reads >= self.single_shot {
                        return Ok(Outcome::CountReached(self.reads));
                    }
                }
                Err(AnalyzerError::Transport(TransportError::Closed)) => {
                    return Ok(Outcome::EndOfInput);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Perform one read and render it. Returns the number of bytes read.
    pub fn step(&mut self) -> Result<usize> {
        let mut chunk = [0u8; 256];
        let read_size = self.mode.read_size();
        let read = self.source.read_bytes(&mut chunk[..read_size])?;
        if read == 0 {
            return Ok(0);
        }
        let bytes = &chunk[..read];

        match self.mode {
            MonitorMode::Passthrough => self.emit(bytes)?,
            MonitorMode::Hexdump => {
                let mut text = String::new();
                self.hexdump.write(bytes, &mut text);
                self.emit(text.as_bytes())?;
            }
            MonitorMode::RawHex => {
                let mut text = String::with_capacity(bytes.len() * 2 + 1);
                for byte in bytes {
                    let _ = write!(text, "{byte:02x}");
                }
                text.push(':');
                self.emit(text.as_bytes())?;
            }
        }
        Ok(read)
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out
            .write_all(bytes)
            .and_then(|()| self.out.flush())
            .map_err(|err| AnalyzerError::sink("monitor output failed", err))
    }

    fn close(&mut self) -> Result<()> {
        let flushed = self
            .out
            .flush()
            .map_err(|err| AnalyzerError::sink("monitor output flush failed", err));
        let drained = self.source.flush();
        debug!("monitor resources released");
        flushed?;
        drained?;
        Ok(())
    }

    /// Consume the monitor and return its source and writer.
    pub fn into_parts(self) -> (S, W) {
        (self.source, self.out)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use dtsmon_transport::StreamSource;

    use super::*;

    fn monitor(bytes: &[u8], mode: MonitorMode) -> Monitor<StreamSource<Cursor<Vec<u8>>>, Vec<u8>> {
        Monitor::new(StreamSource::new(Cursor::new(bytes.to_vec())), Vec::new(), mode)
    }

    fn run_to_end(mut monitor: Monitor<StreamSource<Cursor<Vec<u8>>>, Vec<u8>>) -> (Outcome, String) {
        let outcome = monitor.run(&AtomicBool::new(false)).unwrap();
        let (_, out) = monitor.into_parts();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn passthrough_copies_bytes() {
        let (outcome, out) = run_to_end(monitor(b"hello serial", MonitorMode::Passthrough));
        assert_eq!(outcome, Outcome::EndOfInput);
        assert_eq!(out, "hello serial");
    }

    #[test]
    fn raw_mode_groups_reads_of_two() {
        let (_, out) = run_to_end(monitor(&[0x01, 0xAB, 0x7F], MonitorMode::RawHex));
        assert_eq!(out, "01ab:7f:");
    }

    #[test]
    fn hexdump_mode() {
        let (_, out) = run_to_end(monitor(b"ABC", MonitorMode::Hexdump));
        assert_eq!(out, format!("00000000:  {:<48}  |ABC|\n", "41 42 43"));
    }

    #[test]
    fn single_shot_counts_reads() {
        let monitor = monitor(&[1, 2, 3, 4, 5, 6], MonitorMode::RawHex).with_single_shot(2);
        let (outcome, out) = run_to_end(monitor);
        assert_eq!(outcome, Outcome::CountReached(2));
        assert_eq!(out, "0102:0304:");
    }

    #[test]
    fn shutdown_before_first_read() {
        let mut monitor = monitor(b"unused", MonitorMode::Passthrough);
        let outcome = monitor.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(outcome, Outcome::ShutDown);
        assert_eq!(monitor.reads(), 0);
    }

    #[test]
    fn mode_names_and_read_sizes() {
        assert_eq!(MonitorMode::default(), MonitorMode::Passthrough);
        assert_eq!(MonitorMode::RawHex.read_size(), 2);
        assert_eq!(MonitorMode::Hexdump.read_size(), 256);
        assert_eq!(MonitorMode::Hexdump.name(), "hexdump");
    }
}
