use std::fmt::Write as _;
use std::io::Write;

use dtsmon_schema::DecodedRecord;

use super::Sink;
use crate::error::{AnalyzerError, Result};
use crate::options::{AnalyzerOptions, FrameNumber, LineTerminator, RecordStyle};

/// Width each value is right-justified to.
pub const VALUE_WIDTH: usize = 19;

/// Escape sequences wrapped around labels and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub label: &'static str,
    pub value: &'static str,
    pub reset: &'static str,
}

impl Palette {
    /// Yellow labels, bold white values.
    pub const ANSI: Palette = Palette {
        label: "\x1b[33m",
        value: "\x1b[1;37m",
        reset: "\x1b[0;0m",
    };

    pub const PLAIN: Palette = Palette {
        label: "",
        value: "",
        reset: "",
    };

    pub fn new(color: bool) -> Self {
        if color {
            Self::ANSI
        } else {
            Self::PLAIN
        }
    }
}

/// Prints records to a terminal-like writer.
///
/// Output is flushed after every record so carriage-return refresh shows
/// each frame as it arrives.
pub struct TerminalSink<W: Write> {
    out: W,
    palette: Palette,
    frame_number: FrameNumber,
    terminator: LineTerminator,
    style: RecordStyle,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, options: &AnalyzerOptions) -> Self {
        Self {
            out,
            palette: Palette::new(options.color),
            frame_number: options.frame_number,
            terminator: options.line_terminator,
            style: options.record_style,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Render one record in the columns style, terminator included.
    pub fn format_columns(&self, record: &DecodedRecord) -> String {
        let Palette {
            label: label_color,
            value: value_color,
            reset,
        } = self.palette;

        let mut line = String::new();
        match self.frame_number {
            FrameNumber::Prefix => {
                let _ = write!(line, "#{} | ", record.sequence);
            }
            FrameNumber::Hidden | FrameNumber::Suffix => line.push_str("| "),
        }
        for (label, value) in &record.fields {
            let _ = write!(
                line,
                "{label_color}[{label}]{reset}: {value_color}{:>width$}{reset} | ",
                value.to_string(),
                width = VALUE_WIDTH
            );
        }
        if self.frame_number == FrameNumber::Suffix {
            let _ = write!(line, "{} ", record.sequence);
        }
        line.push_str(self.terminator.as_str());
        line
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for TerminalSink<W> {
    fn write_record(&mut self, record: &DecodedRecord) -> Result<()> {
        match self.style {
            RecordStyle::Columns => {
                let line = self.format_columns(record);
                self.out
                    .write_all(line.as_bytes())
                    .map_err(|err| AnalyzerError::sink("terminal write failed", err))?;
            }
            RecordStyle::Json => {
                serde_json::to_writer(&mut self.out, record)?;
                self.out
                    .write_all(b"\n")
                    .map_err(|err| AnalyzerError::sink("terminal write failed", err))?;
            }
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|err| AnalyzerError::sink("terminal flush failed", err))
    }
}
