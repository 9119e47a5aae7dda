use bytes::BytesMut;
use dtsmon_transport::ByteSource;

use crate::codec::{Assembler, Frame, FrameConfig, SyncState, Synchronizer};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 256;

/// Reads complete frames from any [`ByteSource`].
///
/// Owns the pending-byte buffer: reads append at the tail, the synchronizer
/// and assembler consume from the head. Short and empty reads are handled
/// internally.
pub struct FrameReader<S> {
    source: S,
    buf: BytesMut,
    sync: Synchronizer,
    assembler: Assembler,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a frame reader for frames shaped by `config`.
    pub fn new(source: S, config: FrameConfig) -> Self {
        Self {
            source,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            sync: Synchronizer::new(),
            assembler: Assembler::new(config),
        }
    }

    /// Produce the next frame, performing at most one source read.
    ///
    /// Returns `Ok(None)` when the buffered bytes do not yet hold a complete
    /// frame, so the caller regains control between reads.
    pub fn poll_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.try_assemble() {
            return Ok(Some(frame));
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = self.source.read_bytes(&mut chunk)?;
        self.buf.extend_from_slice(&chunk[..read]);

        Ok(self.try_assemble())
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::Transport(TransportError::Closed))` when the
    /// source runs out of bytes.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.poll_frame()? {
                return Ok(frame);
            }
        }
    }

    fn try_assemble(&mut self) -> Option<Frame> {
        if !self.sync.hunt(&mut self.buf) {
            return None;
        }
        let frame = self.assembler.assemble(&mut self.buf)?;
        self.sync.rearm();
        Some(frame)
    }

    /// Current synchronization state.
    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    /// Bytes read but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Frame shape this reader assembles.
    pub fn config(&self) -> &FrameConfig {
        self.assembler.config()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> S {
        self.source
    }
}
