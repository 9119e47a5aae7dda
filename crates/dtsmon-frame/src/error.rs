use dtsmon_transport::TransportError;

/// Errors that can occur while producing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source failed or closed.
    #[error("frame source error: {0}")]
    Transport(#[from] TransportError),

    /// Too many consecutive frames failed their checksum.
    #[error("{failures} consecutive checksum failures (check the layout descriptor and/or firmware)")]
    Integrity { failures: u32 },
}

impl FrameError {
    /// True when the source simply ran out of bytes.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, FrameError::Transport(TransportError::Closed))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
