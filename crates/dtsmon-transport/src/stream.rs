use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::ByteSource;

/// Adapts any `Read` stream into a [`ByteSource`].
///
/// EOF on the inner stream becomes [`TransportError::Closed`]. Timeouts and
/// interrupted reads become empty reads so the caller simply retries.
pub struct StreamSource<R> {
    inner: R,
    label: String,
}

impl<R: Read> StreamSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self::with_label(inner, "stream")
    }

    /// Wrap a reader with a description for logs.
    pub fn with_label(inner: R, label: impl Into<String>) -> Self {
        Self {
            inner,
            label: label.into(),
        }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the source and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl StreamSource<File> {
    /// Open a captured byte stream for replay.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!(path = %path.display(), "opened capture for replay");
        Ok(Self::with_label(file, format!("replay of {}", path.display())))
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.inner.read(buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
                ) =>
            {
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
