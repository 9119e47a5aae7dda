use std::io::Stdout;
use std::path::Path;

use dtsmon_analyzer::{Analyzer, AnalyzerOptions, FrameNumber, LineTerminator, Pipeline};
use dtsmon_frame::{ChecksumCoverage, IntegrityConfig, DEFAULT_FAILURE_LIMIT};
use dtsmon_schema::{LayoutConfig, Schema, SchemaError};

use crate::cmd::{run_pipeline, AnalyzeArgs};
use crate::exit::{analyzer_error, schema_error, CliError, CliResult};

pub fn run(args: AnalyzeArgs) -> CliResult<i32> {
    let options = options(&args);
    options
        .validate()
        .map_err(|err| analyzer_error("invalid options", err))?;

    let schema = load_schema(&args.desc, args.allow_odd_payload)?;
    let source = args.source.open()?;
    let analyzer = Analyzer::new(source, schema, &options)
        .map_err(|err| analyzer_error("cannot start analyzer", err))?;

    run_pipeline(Pipeline::<_, Stdout>::Frames(analyzer))
}

/// Load a descriptor, pointing at `--allow-odd-payload` when the even-size rule fails.
pub fn load_schema(path: &Path, allow_odd_payload: bool) -> CliResult<Schema> {
    let config = LayoutConfig {
        require_even_payload: !allow_odd_payload,
        ..LayoutConfig::default()
    };
    Schema::from_path_with_config(path, config).map_err(|err| {
        let hint = matches!(err, SchemaError::OddPayloadSize(_));
        let mut cli_err: CliError = schema_error(&format!("cannot load {}", path.display()), err);
        if hint {
            cli_err
                .message
                .push_str(" (pass --allow-odd-payload if the device really sends odd-sized frames)");
        }
        cli_err
    })
}

pub fn options(args: &AnalyzeArgs) -> AnalyzerOptions {
    let coverage = if args.checksum_covers_marker {
        ChecksumCoverage::MarkerAndPayload
    } else {
        ChecksumCoverage::Payload
    };

    AnalyzerOptions {
        descriptor_path: args.desc.clone(),
        log_path: args.log.clone(),
        terminal: !args.no_stdout,
        frame_number: args
            .frame_number
            .map_or(FrameNumber::Hidden, FrameNumber::from),
        line_terminator: if args.newline {
            LineTerminator::Newline
        } else {
            LineTerminator::CarriageReturn
        },
        single_shot: args.single,
        integrity: IntegrityConfig {
            enabled: !args.no_checksum,
            coverage,
            failure_limit: args.max_checksum_failures.unwrap_or(DEFAULT_FAILURE_LIMIT),
        },
        record_style: args.records.into(),
        color: args.color.enabled(),
    }
}
