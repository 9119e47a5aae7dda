use std::path::{Path, PathBuf};

use dtsmon_frame::IntegrityConfig;

use crate::error::{AnalyzerError, Result};

/// Where the frame sequence number appears on a terminal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameNumber {
    #[default]
    Hidden,
    /// `#<n> | ` before the fields.
    Prefix,
    /// `<n> ` after the fields.
    Suffix,
}

/// How each terminal line ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    /// Overwrite the same line on every frame.
    #[default]
    CarriageReturn,
    Newline,
}

impl LineTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineTerminator::CarriageReturn => "\r",
            LineTerminator::Newline => "\n",
        }
    }
}

/// Terminal record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordStyle {
    /// Fixed-width `[label]: value` columns.
    #[default]
    Columns,
    /// One JSON object per line.
    Json,
}

/// Options for an analyzer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Descriptor the layout came from, named in the log file header.
    pub descriptor_path: PathBuf,
    /// CSV log destination. `None` or an empty path disables file logging.
    pub log_path: Option<PathBuf>,
    /// Print records to the terminal.
    pub terminal: bool,
    pub frame_number: FrameNumber,
    pub line_terminator: LineTerminator,
    /// Stop after this many dispatched frames. 0 = unbounded.
    pub single_shot: u64,
    pub integrity: IntegrityConfig,
    pub record_style: RecordStyle,
    /// Emit ANSI colors on the terminal.
    pub color: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            descriptor_path: PathBuf::from("descriptor-examples/defaultstruct.json"),
            log_path: None,
            terminal: true,
            frame_number: FrameNumber::Hidden,
            line_terminator: LineTerminator::CarriageReturn,
            single_shot: 0,
            integrity: IntegrityConfig::default(),
            record_style: RecordStyle::Columns,
            color: false,
        }
    }
}

impl AnalyzerOptions {
    /// The log file path, if file logging is enabled.
    pub fn log_target(&self) -> Option<&Path> {
        self.log_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Reject option combinations that would produce no output.
    pub fn validate(&self) -> Result<()> {
        if !self.terminal && self.log_target().is_none() {
            return Err(AnalyzerError::Config(
                "terminal output is disabled and no log file was given".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_print_to_terminal() {
        let options = AnalyzerOptions::default();
        assert!(options.terminal);
        assert!(options.log_target().is_none());
        assert!(options.validate().is_ok());
        assert_eq!(options.line_terminator.as_str(), "\r");
    }

    #[test]
    fn no_output_is_rejected() {
        let options = AnalyzerOptions {
            terminal: false,
            ..AnalyzerOptions::default()
        };
        assert!(matches!(options.validate(), Err(AnalyzerError::Config(_))));
    }

    #[test]
    fn empty_log_path_counts_as_disabled() {
        let options = AnalyzerOptions {
            terminal: false,
            log_path: Some(PathBuf::new()),
            ..AnalyzerOptions::default()
        };
        assert!(options.log_target().is_none());
        assert!(options.validate().is_err());
    }

    #[test]
    fn log_only_is_accepted() {
        let options = AnalyzerOptions {
            terminal: false,
            log_path: Some(PathBuf::from("run.csv")),
            ..AnalyzerOptions::default()
        };
        assert_eq!(options.log_target(), Some(Path::new("run.csv")));
        assert!(options.validate().is_ok());
    }
}
