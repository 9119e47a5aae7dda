use std::fmt;
use std::io;

use dtsmon_analyzer::AnalyzerError;
use dtsmon_schema::SchemaError;
use dtsmon_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const CONFIG_INVALID: i32 = 78;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::InvalidSetting(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    CliError::new(CONFIG_INVALID, format!("{context}: {err}"))
}

pub fn analyzer_error(context: &str, err: AnalyzerError) -> CliError {
    match err {
        AnalyzerError::Config(_) => CliError::new(CONFIG_INVALID, format!("{context}: {err}")),
        AnalyzerError::Schema(err) => schema_error(context, err),
        AnalyzerError::Transport(err) => transport_error(context, err),
        AnalyzerError::Integrity { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        AnalyzerError::Sink { context: sink, source } => io_error(&format!("{context}: {sink}"), source),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
