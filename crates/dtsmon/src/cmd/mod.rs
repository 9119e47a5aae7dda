use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use dtsmon_analyzer::{FrameNumber, MonitorMode, Pipeline, RecordStyle};
use dtsmon_transport::{
    ByteSource, DataBits, Parity, SerialSettings, SerialSource, StopBits, StreamSource,
    DEFAULT_BAUD_RATE,
};
use tracing::info;

use crate::exit::{analyzer_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{ColorChoice, OutputFormat};

pub mod analyze;
pub mod describe;
pub mod monitor;
pub mod ports;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode framed records from a serial device or capture.
    Analyze(AnalyzeArgs),
    /// Show raw bytes from a serial device or capture.
    Monitor(MonitorArgs),
    /// Load a layout descriptor and print its fields.
    Describe(DescribeArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Analyze(args) => analyze::run(args),
        Command::Monitor(args) => monitor::run(args),
        Command::Describe(args) => describe::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where bytes come from.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(
        long,
        env = "DTSMON_PORT",
        conflicts_with = "input",
        required_unless_present = "input"
    )]
    pub port: Option<String>,
    /// Replay a captured byte stream instead of opening a device.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Line rate in bits per second.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Data bits per character (5-8).
    #[arg(long, default_value_t = 8)]
    pub data_bits: u8,
    /// Stop bits (1 or 2).
    #[arg(long, default_value_t = 1)]
    pub stop_bits: u8,
    /// Parity: none, odd or even.
    #[arg(long, default_value = "even")]
    pub parity: Parity,
    /// Longest a single device read may block, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub read_timeout_ms: u64,
}

impl SourceArgs {
    pub fn settings(&self, port: &str) -> CliResult<SerialSettings> {
        let data_bits = DataBits::try_from(self.data_bits)
            .map_err(|err| transport_error("invalid serial settings", err))?;
        let stop_bits = StopBits::try_from(self.stop_bits)
            .map_err(|err| transport_error("invalid serial settings", err))?;

        Ok(SerialSettings {
            port: port.to_string(),
            baud_rate: self.baud,
            data_bits,
            stop_bits,
            parity: self.parity,
            read_timeout: Duration::from_millis(self.read_timeout_ms.max(1)),
        })
    }

    pub fn open(&self) -> CliResult<Box<dyn ByteSource>> {
        if let Some(path) = &self.input {
            let source = StreamSource::open(path)
                .map_err(|err| transport_error(&format!("cannot open {}", path.display()), err))?;
            return Ok(Box::new(source));
        }

        let port = self.port.as_deref().unwrap_or_default();
        let settings = self.settings(port)?;
        let source = SerialSource::open(&settings)
            .map_err(|err| transport_error("cannot open serial device", err))?;
        Ok(Box::new(source))
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FrameNumberArg {
    Suffix,
    Prefix,
}

impl From<FrameNumberArg> for FrameNumber {
    fn from(arg: FrameNumberArg) -> Self {
        match arg {
            FrameNumberArg::Suffix => FrameNumber::Suffix,
            FrameNumberArg::Prefix => FrameNumber::Prefix,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum RecordsArg {
    #[default]
    Columns,
    Json,
}

impl From<RecordsArg> for RecordStyle {
    fn from(arg: RecordsArg) -> Self {
        match arg {
            RecordsArg::Columns => RecordStyle::Columns,
            RecordsArg::Json => RecordStyle::Json,
        }
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Layout descriptor.
    #[arg(
        long,
        short = 'd',
        value_name = "FILE",
        default_value = "descriptor-examples/defaultstruct.json"
    )]
    pub desc: PathBuf,
    /// Append decoded rows to FILE as CSV.
    #[arg(long, short = 'l', value_name = "FILE")]
    pub log: Option<PathBuf>,
    /// Do not print records to stdout (requires --log).
    #[arg(long)]
    pub no_stdout: bool,
    /// Show the frame number (suffix when no position is given).
    #[arg(
        long,
        short = 'n',
        value_name = "POSITION",
        num_args = 0..=1,
        default_missing_value = "suffix"
    )]
    pub frame_number: Option<FrameNumberArg>,
    /// End each record with a newline instead of refreshing one line.
    #[arg(long, short = 'r')]
    pub newline: bool,
    /// Stop after N frames (0 = run until interrupted).
    #[arg(long, short = 's', value_name = "N", default_value_t = 0)]
    pub single: u64,
    /// Frames carry no trailing checksum byte.
    #[arg(long, conflicts_with_all = ["checksum_covers_marker", "max_checksum_failures"])]
    pub no_checksum: bool,
    /// The checksum covers the marker as well as the payload.
    #[arg(long)]
    pub checksum_covers_marker: bool,
    /// Consecutive checksum failures that abort the run.
    #[arg(long, value_name = "N")]
    pub max_checksum_failures: Option<u32>,
    /// Accept layouts whose payload size is odd.
    #[arg(long)]
    pub allow_odd_payload: bool,
    /// Record layout on stdout.
    #[arg(long, value_name = "STYLE", default_value = "columns")]
    pub records: RecordsArg,
    /// Color terminal records.
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ModeArg {
    #[default]
    Normal,
    Hexdump,
    Raw,
}

impl From<ModeArg> for MonitorMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Normal => MonitorMode::Passthrough,
            ModeArg::Hexdump => MonitorMode::Hexdump,
            ModeArg::Raw => MonitorMode::RawHex,
        }
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Rendering mode.
    #[arg(long, short = 'm', default_value = "normal")]
    pub mode: ModeArg,
    /// Stop after N reads that returned data (0 = run until interrupted).
    #[arg(long, short = 's', value_name = "N", default_value_t = 0)]
    pub single: u64,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Layout descriptor.
    pub desc: PathBuf,
    /// Accept layouts whose payload size is odd.
    #[arg(long)]
    pub allow_odd_payload: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Run a pipeline until it ends, stopping cleanly on Ctrl-C.
pub fn run_pipeline<S: ByteSource, W: Write>(mut pipeline: Pipeline<S, W>) -> CliResult<i32> {
    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(shutdown.clone())?;

    let outcome = pipeline
        .run(&shutdown)
        .map_err(|err| analyzer_error("run failed", err))?;
    info!(%outcome, "exiting");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(shutdown: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
