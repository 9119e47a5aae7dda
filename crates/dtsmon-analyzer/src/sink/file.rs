use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use dtsmon_schema::DecodedRecord;
use tracing::debug;

use super::Sink;
use crate::error::{AnalyzerError, Result};

/// Width of the `#` rule separating sessions in one log file.
pub const SESSION_RULE_WIDTH: usize = 79;

/// Appends records to a CSV log file.
///
/// A new file starts with the session header. An existing file gets a
/// separator first, so several sessions can share one log.
pub struct FileSink {
    path: PathBuf,
    out: LineWriter<File>,
}

impl FileSink {
    /// Open `path` for appending and write the session header.
    pub fn open<'a>(
        path: impl AsRef<Path>,
        descriptor: &Path,
        labels: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let existed = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                AnalyzerError::sink(format!("failed to open log file {}", path.display()), err)
            })?;

        let mut sink = Self {
            path: path.to_path_buf(),
            out: LineWriter::new(file),
        };

        let mut header = String::new();
        if existed {
            header.push_str("\n\n\n");
            header.push_str(&"#".repeat(SESSION_RULE_WIDTH));
            header.push('\n');
        }
        header.push_str(&format!(
            "# Log generated by dtsmon using layout descriptor: '{}'\n",
            descriptor.display()
        ));
        header.push_str("Frame");
        for label in labels {
            header.push(',');
            header.push_str(label);
        }
        header.push('\n');
        sink.write_line(&header)?;

        debug!(path = %path.display(), appended = existed, "log file opened");
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.out.write_all(line.as_bytes()).map_err(|err| {
            AnalyzerError::sink(format!("failed to write {}", self.path.display()), err)
        })
    }
}

impl Sink for FileSink {
    fn write_record(&mut self, record: &DecodedRecord) -> Result<()> {
        let mut row = record.sequence.to_string();
        for value in record.values() {
            row.push(',');
            row.push_str(&value.to_string());
        }
        row.push('\n');
        self.write_line(&row)
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(|err| {
            AnalyzerError::sink(format!("failed to flush {}", self.path.display()), err)
        })
    }
}
