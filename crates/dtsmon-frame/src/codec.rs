use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

/// Start-of-frame marker.
pub const MARKER: [u8; 4] = [0x73, 0x95, 0xDB, 0x42];

/// A fixed-size frame cut from the stream after one marker detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position of this frame in the stream, starting at 1.
    pub sequence: u64,
    /// Exactly `payload_size` bytes.
    pub payload: Bytes,
    /// Trailing checksum byte, present when integrity checking is enabled.
    pub checksum: Option<u8>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(sequence: u64, payload: impl Into<Bytes>, checksum: Option<u8>) -> Self {
        Self {
            sequence,
            payload: payload.into(),
            checksum,
        }
    }

    /// The total wire size of this frame (marker + payload + trailer).
    pub fn wire_size(&self) -> usize {
        MARKER.len() + self.payload.len() + usize::from(self.checksum.is_some())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────┬──────────────┐
/// │ Marker (4B)  │ Payload              │ Checksum     │
/// │ 73 95 DB 42  │ (payload_size bytes) │ (1B, opt.)   │
/// └──────────────┴──────────────────────┴──────────────┘
/// ```
pub fn encode_frame(payload: &[u8], checksum: Option<u8>, dst: &mut BytesMut) {
    dst.reserve(MARKER.len() + payload.len() + 1);
    dst.put_slice(&MARKER);
    dst.put_slice(payload);
    if let Some(byte) = checksum {
        dst.put_u8(byte);
    }
}

/// Configuration for frame assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Payload bytes following each marker.
    pub payload_size: usize,
    /// Whether a checksum byte trails the payload.
    pub checksum: bool,
}

impl FrameConfig {
    /// Frames of `payload_size` bytes followed by a checksum byte.
    pub fn new(payload_size: usize) -> Self {
        Self {
            payload_size,
            checksum: true,
        }
    }

    /// Toggle the checksum trailer.
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    /// Bytes consumed after the marker for one frame.
    pub fn body_len(&self) -> usize {
        self.payload_size + usize::from(self.checksum)
    }
}

/// Synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Scanning for the marker.
    Hunting,
    /// Marker found, accumulating a fixed-length body.
    Locked,
}

/// Hunts the start marker in a byte buffer.
///
/// Bytes are consumed from the head of the buffer one at a time. A byte that
/// breaks a partial match is compared again against the first marker byte;
/// the marker's bytes are pairwise distinct, so this finds the first true
/// occurrence after any amount of garbage.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    state: SyncState,
    matched: usize,
    skipped: usize,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self {
            state: SyncState::Hunting,
            matched: 0,
            skipped: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == SyncState::Locked
    }

    /// Bytes discarded as garbage since the last lock.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Consume bytes from `buf` until the marker completes or `buf` runs dry.
    ///
    /// Returns true once locked. A partial match survives across calls, so
    /// a marker split over two reads is still found.
    pub fn hunt(&mut self, buf: &mut BytesMut) -> bool {
        if self.is_locked() {
            return true;
        }

        while buf.has_remaining() {
            let byte = buf.get_u8();
            if byte == MARKER[self.matched] {
                self.matched += 1;
            } else if byte == MARKER[0] {
                self.skipped += self.matched;
                self.matched = 1;
            } else {
                self.skipped += self.matched + 1;
                self.matched = 0;
            }

            if self.matched == MARKER.len() {
                debug!(skipped = self.skipped, "marker found");
                self.matched = 0;
                self.state = SyncState::Locked;
                return true;
            }
        }

        false
    }

    /// Go back to hunting. Every frame must be preceded by a fresh marker.
    pub fn rearm(&mut self) {
        self.state = SyncState::Hunting;
        self.matched = 0;
        self.skipped = 0;
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cuts a fixed-size frame from the buffer once the marker is locked.
#[derive(Debug, Clone)]
pub struct Assembler {
    config: FrameConfig,
    next_sequence: u64,
}

impl Assembler {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            next_sequence: 1,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Sequence number the next assembled frame will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Take one frame body from the head of `buf`.
    ///
    /// Returns `None` without consuming anything while fewer than
    /// [`FrameConfig::body_len`] bytes are buffered. The content is never
    /// inspected, so marker-like bytes inside a payload are taken as data.
    pub fn assemble(&mut self, buf: &mut BytesMut) -> Option<Frame> {
        if buf.len() < self.config.body_len() {
            return None;
        }

        let payload = buf.split_to(self.config.payload_size).freeze();
        let checksum = self.config.checksum.then(|| buf.get_u8());
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        trace!(sequence, size = payload.len(), "frame assembled");
        Some(Frame {
            sequence,
            payload,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunt_all(sync: &mut Synchronizer, bytes: &[u8]) -> (bool, BytesMut) {
        let mut buf = BytesMut::from(bytes);
        let locked = sync.hunt(&mut buf);
        (locked, buf)
    }

    #[test]
    fn test_encode_layout() {
        let mut buf = BytesMut::new();
        encode_frame(&[1, 2, 3, 4], Some(0xAA), &mut buf);

        assert_eq!(buf.as_ref(), &[0x73, 0x95, 0xDB, 0x42, 1, 2, 3, 4, 0xAA]);
    }

    #[test]
    fn test_locks_on_bare_marker() {
        let mut sync = Synchronizer::new();
        let (locked, rest) = hunt_all(&mut sync, &MARKER);

        assert!(locked);
        assert!(rest.is_empty());
        assert_eq!(sync.state(), SyncState::Locked);
        assert_eq!(sync.skipped(), 0);
    }

    #[test]
    fn test_garbage_before_marker_is_discarded() {
        for garbage_len in [0usize, 1, 3, 17, 255] {
            let mut stream: Vec<u8> = (0..garbage_len).map(|i| (i % 0x70) as u8).collect();
            stream.extend_from_slice(&MARKER);
            stream.extend_from_slice(&[0xDE, 0xAD]);

            let mut sync = Synchronizer::new();
            let (locked, rest) = hunt_all(&mut sync, &stream);

            assert!(locked, "garbage length {garbage_len}");
            assert_eq!(rest.as_ref(), &[0xDE, 0xAD]);
            assert_eq!(sync.skipped(), garbage_len);
        }
    }

    #[test]
    fn test_partial_marker_in_garbage_does_not_delay_lock() {
        let mut stream = vec![0x73, 0x95, 0x00, 0x73, 0x73, 0x95, 0xDB];
        stream.extend_from_slice(&MARKER);
        stream.push(0x01);

        let mut sync = Synchronizer::new();
        let (locked, rest) = hunt_all(&mut sync, &stream);

        assert!(locked);
        assert_eq!(rest.as_ref(), &[0x01]);
        assert_eq!(sync.skipped(), 7);
    }

    #[test]
    fn test_marker_split_across_calls() {
        let mut sync = Synchronizer::new();

        let (locked, _) = hunt_all(&mut sync, &[0x00, 0x73, 0x95]);
        assert!(!locked);
        assert_eq!(sync.state(), SyncState::Hunting);

        let (locked, rest) = hunt_all(&mut sync, &[0xDB, 0x42, 0x07]);
        assert!(locked);
        assert_eq!(rest.as_ref(), &[0x07]);
    }

    #[test]
    fn test_no_marker_consumes_everything() {
        let mut sync = Synchronizer::new();
        let (locked, rest) = hunt_all(&mut sync, &[0x01, 0x02, 0x03, 0x04, 0x05]);

        assert!(!locked);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_locked_hunt_consumes_nothing() {
        let mut sync = Synchronizer::new();
        hunt_all(&mut sync, &MARKER);

        let mut buf = BytesMut::from(&[0x11, 0x22][..]);
        assert!(sync.hunt(&mut buf));
        assert_eq!(buf.len(), 2);

        sync.rearm();
        assert_eq!(sync.state(), SyncState::Hunting);
    }

    #[test]
    fn test_assemble_waits_for_full_body() {
        let mut assembler = Assembler::new(FrameConfig::new(4));
        let mut buf = BytesMut::from(&[1, 2, 3, 4][..]);

        assert!(assembler.assemble(&mut buf).is_none());
        assert_eq!(buf.len(), 4);

        buf.put_u8(0x5A);
        let frame = assembler.assemble(&mut buf).unwrap();
        assert_eq!(frame.sequence, 1);
        assert_eq!(frame.payload.as_ref(), &[1, 2, 3, 4]);
        assert_eq!(frame.checksum, Some(0x5A));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_assemble_without_checksum() {
        let mut assembler = Assembler::new(FrameConfig::new(2).with_checksum(false));
        let mut buf = BytesMut::from(&[0xAB, 0xCD, 0xEF][..]);

        let frame = assembler.assemble(&mut buf).unwrap();
        assert_eq!(frame.payload.as_ref(), &[0xAB, 0xCD]);
        assert_eq!(frame.checksum, None);
        assert_eq!(buf.as_ref(), &[0xEF]);
    }

    #[test]
    fn test_marker_inside_payload_is_data() {
        let mut assembler = Assembler::new(FrameConfig::new(8).with_checksum(false));
        let mut buf = BytesMut::new();
        buf.put_slice(&MARKER);
        buf.put_slice(&MARKER);

        let frame = assembler.assemble(&mut buf).unwrap();
        assert_eq!(frame.payload.as_ref(), [MARKER, MARKER].concat().as_slice());
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut assembler = Assembler::new(FrameConfig::new(2).with_checksum(false));
        let mut buf = BytesMut::from(&[1, 1, 2, 2, 3, 3][..]);

        let sequences: Vec<u64> = std::iter::from_fn(|| assembler.assemble(&mut buf))
            .map(|frame| frame.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(assembler.next_sequence(), 4);
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(1, Bytes::from_static(b"test"), Some(0));
        assert_eq!(frame.wire_size(), MARKER.len() + 4 + 1);

        let frame = Frame::new(1, Bytes::from_static(b"test"), None);
        assert_eq!(frame.wire_size(), MARKER.len() + 4);
    }
}
