use tracing::warn;

use crate::codec::{Frame, MARKER};
use crate::error::{FrameError, Result};

/// Consecutive checksum failures tolerated before giving up.
pub const DEFAULT_FAILURE_LIMIT: u32 = 10;

const POLYNOMIAL: u16 = 0x1070 << 3;

/// Checksum of `bytes` as carried in the frame trailer.
///
/// Each byte is XORed into the high byte of a 16-bit register, followed by
/// eight shift rounds that fold in the polynomial whenever the top bit is set.
/// The high byte of the register is the result.
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut register: u16 = 0;
    for &byte in bytes {
        register ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if register & 0x8000 != 0 {
                register ^= POLYNOMIAL;
            }
            register <<= 1;
        }
    }
    (register >> 8) as u8
}

/// Which bytes of a frame the trailer covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumCoverage {
    /// Payload bytes only.
    #[default]
    Payload,
    /// Marker followed by payload (older firmware).
    MarkerAndPayload,
}

/// Expected trailer for `payload` under `coverage`.
pub fn frame_checksum(payload: &[u8], coverage: ChecksumCoverage) -> u8 {
    match coverage {
        ChecksumCoverage::Payload => checksum(payload),
        ChecksumCoverage::MarkerAndPayload => {
            let mut covered = Vec::with_capacity(MARKER.len() + payload.len());
            covered.extend_from_slice(&MARKER);
            covered.extend_from_slice(payload);
            checksum(&covered)
        }
    }
}

/// Controls frame integrity checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityConfig {
    /// When false, frames carry no trailer and are never checked.
    pub enabled: bool,
    pub coverage: ChecksumCoverage,
    /// Consecutive failures that abort the run. Default: 10.
    pub failure_limit: u32,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            coverage: ChecksumCoverage::Payload,
            failure_limit: DEFAULT_FAILURE_LIMIT,
        }
    }
}

/// Outcome of checking one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// The frame should be dropped.
    Mismatch {
        expected: u8,
        received: Option<u8>,
        consecutive: u32,
    },
}

/// Verifies frame trailers and trips after too many failures in a row.
///
/// Sustained failure points at a layout/firmware mismatch rather than line
/// noise, so the run is stopped instead of retrying forever.
#[derive(Debug, Clone)]
pub struct IntegrityChecker {
    coverage: ChecksumCoverage,
    failure_limit: u32,
    consecutive_failures: u32,
    total_failures: u64,
}

impl IntegrityChecker {
    pub fn new(config: IntegrityConfig) -> Self {
        Self {
            coverage: config.coverage,
            failure_limit: config.failure_limit.max(1),
            consecutive_failures: 0,
            total_failures: 0,
        }
    }

    /// Check one frame.
    ///
    /// A match resets the failure counter. A mismatch increments it and
    /// returns [`Verdict::Mismatch`], or [`FrameError::Integrity`] once the
    /// counter reaches the limit.
    pub fn check(&mut self, frame: &Frame) -> Result<Verdict> {
        let expected = frame_checksum(frame.payload.as_ref(), self.coverage);
        if frame.checksum == Some(expected) {
            self.consecutive_failures = 0;
            return Ok(Verdict::Valid);
        }

        self.consecutive_failures += 1;
        self.total_failures += 1;
        warn!(
            sequence = frame.sequence,
            expected = format_args!("{expected:#04x}"),
            received = ?frame.checksum,
            consecutive = self.consecutive_failures,
            "checksum mismatch, dropping frame"
        );

        if self.consecutive_failures >= self.failure_limit {
            return Err(FrameError::Integrity {
                failures: self.consecutive_failures,
            });
        }

        Ok(Verdict::Mismatch {
            expected,
            received: frame.checksum,
            consecutive: self.consecutive_failures,
        })
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }
}
