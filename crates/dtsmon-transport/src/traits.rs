use crate::error::Result;

/// A blocking source of raw bytes with no message boundaries of its own.
///
/// This is the only contract the framing layer relies on. A read may return
/// fewer bytes than requested, including zero when nothing arrived before the
/// source's read timeout; callers retry. End of input is reported as
/// [`TransportError::Closed`](crate::TransportError::Closed), never as `Ok(0)`.
///
/// Closing is tied to `Drop`: implementations release their handle there.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes into `buf`, returning how many were written.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Discard anything buffered by the device but not yet read.
    fn flush(&mut self) -> Result<()>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String {
        "byte source".to_string()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_bytes(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_bytes(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
