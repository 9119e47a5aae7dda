use std::fmt::Write as _;

/// Bytes shown on each dump line.
pub const BYTES_PER_LINE: usize = 16;

const HEX_COLUMN_WIDTH: usize = BYTES_PER_LINE * 3;

/// Canonical hex dump with an offset that runs across calls.
#[derive(Debug, Default, Clone)]
pub struct Hexdump {
    offset: u64,
}

impl Hexdump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the next byte to be dumped.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Append dump lines for `bytes` to `out`.
    ///
    /// Each call starts a new line, so a short read shows up immediately
    /// instead of waiting for a full line.
    pub fn write(&mut self, bytes: &[u8], out: &mut String) {
        for chunk in bytes.chunks(BYTES_PER_LINE) {
            out.push_str(&format_line(self.offset, chunk));
            out.push('\n');
            self.offset += chunk.len() as u64;
        }
    }
}

/// One dump line: `%08x:  <hex>  |<printable>|`.
pub fn format_line(offset: u64, chunk: &[u8]) -> String {
    let mut hex = String::with_capacity(HEX_COLUMN_WIDTH + 1);
    for (i, byte) in chunk.iter().enumerate() {
        if i > 0 {
            hex.push(' ');
        }
        if i == 8 {
            hex.push(' ');
        }
        let _ = write!(hex, "{byte:02x}");
    }

    let printable: String = chunk
        .iter()
        .map(|&byte| {
            if byte.is_ascii_graphic() || byte == b' ' {
                char::from(byte)
            } else {
                '.'
            }
        })
        .collect();

    format!("{offset:08x}:  {hex:<HEX_COLUMN_WIDTH$}  |{printable}|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_line_is_padded() {
        let line = format_line(0, b"test");
        assert_eq!(
            line,
            format!("00000000:  {:<48}  |test|", "74 65 73 74")
        );
    }

    #[test]
    fn gap_after_eighth_byte() {
        let bytes: Vec<u8> = (0u8..16).collect();
        let line = format_line(0x10, &bytes);
        assert_eq!(
            line,
            "00000010:  00 01 02 03 04 05 06 07  08 09 0a 0b 0c 0d 0e 0f  |................|"
        );
    }

    #[test]
    fn non_printable_bytes_are_dots() {
        let line = format_line(0, &[b'A', 0x00, 0x7F, 0xFF, b' ', b'z']);
        assert!(line.ends_with("|A... z|"), "{line}");
    }

    #[test]
    fn offset_runs_across_writes() {
        let mut dump = Hexdump::new();
        let mut out = String::new();

        dump.write(&[0xAA; 20], &mut out);
        dump.write(&[0xBB; 3], &mut out);

        let offsets: Vec<&str> = out.lines().map(|line| &line[..8]).collect();
        assert_eq!(offsets, vec!["00000000", "00000010", "00000014"]);
        assert_eq!(dump.offset(), 23);
    }

    #[test]
    fn empty_write_emits_nothing() {
        let mut dump = Hexdump::new();
        let mut out = String::new();
        dump.write(&[], &mut out);
        assert!(out.is_empty());
    }
}
