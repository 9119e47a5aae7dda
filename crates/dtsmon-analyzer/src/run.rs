use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use dtsmon_frame::{FrameConfig, FrameReader, IntegrityChecker, Verdict};
use dtsmon_schema::{decode, DecodedRecord, Schema};
use dtsmon_transport::{ByteSource, TransportError};
use tracing::{debug, info, warn};

use crate::error::{AnalyzerError, Result};
use crate::monitor::Monitor;
use crate::options::AnalyzerOptions;
use crate::sink::{FileSink, Sink, TerminalSink};

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The shutdown flag was raised.
    ShutDown,
    /// The single-shot count was reached.
    CountReached(u64),
    /// The source ran out of bytes.
    EndOfInput,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::ShutDown => f.write_str("shut down"),
            Outcome::CountReached(count) => write!(f, "stopped after {count}"),
            Outcome::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Decodes frames from a byte source and dispatches them to sinks.
///
/// Owns every resource of the run: the source (through the frame reader),
/// the integrity checker, and the sinks. [`Analyzer::run`] releases them on
/// every exit path.
pub struct Analyzer<S: ByteSource> {
    reader: FrameReader<S>,
    schema: Schema,
    integrity: Option<IntegrityChecker>,
    sinks: Vec<Box<dyn Sink>>,
    single_shot: u64,
    dispatched: u64,
}

impl<S: ByteSource> Analyzer<S> {
    /// Build an analyzer printing to stdout and/or the log file in `options`.
    pub fn new(source: S, schema: Schema, options: &AnalyzerOptions) -> Result<Self> {
        options.validate()?;

        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
        if options.terminal {
            sinks.push(Box::new(TerminalSink::new(std::io::stdout(), options)));
        }
        if let Some(path) = options.log_target() {
            sinks.push(Box::new(FileSink::open(
                path,
                &options.descriptor_path,
                schema.labels(),
            )?));
        }

        Self::with_sinks(source, schema, options, sinks)
    }

    /// Build an analyzer over caller-provided sinks.
    pub fn with_sinks(
        source: S,
        schema: Schema,
        options: &AnalyzerOptions,
        sinks: Vec<Box<dyn Sink>>,
    ) -> Result<Self> {
        if sinks.is_empty() {
            return Err(AnalyzerError::Config("no record sink configured".to_string()));
        }

        let frame_config =
            FrameConfig::new(schema.payload_size()).with_checksum(options.integrity.enabled);
        let integrity = options
            .integrity
            .enabled
            .then(|| IntegrityChecker::new(options.integrity));

        info!(
            source = %source.describe(),
            payload_size = schema.payload_size(),
            descriptor = %options.descriptor_path.display(),
            terminal = options.terminal,
            log = ?options.log_target(),
            checksum = options.integrity.enabled,
            "analyzer started"
        );

        Ok(Self {
            reader: FrameReader::new(source, frame_config),
            schema,
            integrity,
            sinks,
            single_shot: options.single_shot,
            dispatched: 0,
        })
    }

    /// Run until shutdown, the single-shot count, end of input, or an error.
    ///
    /// The shutdown flag is checked between source reads.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<Outcome> {
        let result = self.run_inner(shutdown);
        let closed = self.close();
        let outcome = result?;
        closed?;

        info!(%outcome, frames = self.dispatched, "analyzer stopped");
        Ok(outcome)
    }

    fn run_inner(&mut self, shutdown: &AtomicBool) -> Result<Outcome> {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                return Ok(Outcome::ShutDown);
            }

            match self.process() {
                Ok(Some(_)) => {
                    if self.single_shot > 0 && self.dispatched >= self.single_shot {
                        return Ok(Outcome::CountReached(self.dispatched));
                    }
                }
                Ok(None) => {}
                Err(AnalyzerError::Transport(TransportError::Closed)) => {
                    return Ok(Outcome::EndOfInput);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Advance by at most one source read.
    ///
    /// Returns the record dispatched to the sinks, or `None` when no complete
    /// valid frame was available yet.
    pub fn process(&mut self) -> Result<Option<DecodedRecord>> {
        let Some(frame) = self.reader.poll_frame()? else {
            return Ok(None);
        };

        if let Some(checker) = self.integrity.as_mut() {
            if let Verdict::Mismatch { .. } = checker.check(&frame)? {
                return Ok(None);
            }
        }

        let record = decode(&frame, &self.schema)?;
        for sink in &mut self.sinks {
            sink.write_record(&record)?;
        }
        self.dispatched += 1;
        Ok(Some(record))
    }

    /// Flush every sink and drain the source.
    ///
    /// All resources are attempted; the first failure is returned.
    pub fn close(&mut self) -> Result<()> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.flush() {
                warn!(error = %err, "sink flush failed");
                first_error.get_or_insert(err);
            }
        }
        if let Err(err) = self.reader.get_mut().flush() {
            warn!(error = %err, "source flush failed");
            first_error.get_or_insert(AnalyzerError::Transport(err));
        }
        debug!("analyzer resources released");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Records dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Frames dropped for a bad checksum so far.
    pub fn integrity_failures(&self) -> u64 {
        self.integrity
            .as_ref()
            .map_or(0, IntegrityChecker::total_failures)
    }
}

/// The processing pipeline selected for a run.
pub enum Pipeline<S: ByteSource, W: Write> {
    /// Raw bytes rendered by a [`Monitor`].
    Bytes(Monitor<S, W>),
    /// Framed, checked, and decoded records.
    Frames(Analyzer<S>),
}

impl<S: ByteSource, W: Write> Pipeline<S, W> {
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<Outcome> {
        match self {
            Pipeline::Bytes(monitor) => monitor.run(shutdown),
            Pipeline::Frames(analyzer) => analyzer.run(shutdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::rc::Rc;

    use bytes::BytesMut;
    use dtsmon_frame::{checksum, encode_frame, IntegrityConfig};
    use dtsmon_schema::Value;
    use dtsmon_transport::StreamSource;

    use super::*;
    use crate::monitor::MonitorMode;

    const LAYOUT: &str = r#"{
        "endianness": "little",
        "items": [
            { "seq": "uInt16" },
            { "": "byte" },
            { "temp": "float" },
            { "": "byte" }
        ]
    }"#;

    #[derive(Default, Clone)]
    struct Collected {
        records: Rc<RefCell<Vec<DecodedRecord>>>,
        flushes: Rc<RefCell<u32>>,
    }

    struct CollectSink(Collected);

    impl Sink for CollectSink {
        fn write_record(&mut self, record: &DecodedRecord) -> Result<()> {
            self.0.records.borrow_mut().push(record.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            *self.0.flushes.borrow_mut() += 1;
            Ok(())
        }
    }

    fn payload(seq: u16, temp: f32) -> Vec<u8> {
        let mut payload = seq.to_le_bytes().to_vec();
        payload.push(0xFF);
        payload.extend_from_slice(&temp.to_le_bytes());
        payload.push(0x00);
        payload
    }

    fn good(payload: &[u8]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_frame(payload, Some(checksum(payload)), &mut wire);
        wire.to_vec()
    }

    fn bad(payload: &[u8]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_frame(payload, Some(checksum(payload) ^ 0x5A), &mut wire);
        wire.to_vec()
    }

    fn analyzer(
        bytes: Vec<u8>,
        options: &AnalyzerOptions,
    ) -> (Analyzer<StreamSource<Cursor<Vec<u8>>>>, Collected) {
        let collected = Collected::default();
        let schema = Schema::from_json_str(LAYOUT).unwrap();
        let analyzer = Analyzer::with_sinks(
            StreamSource::new(Cursor::new(bytes)),
            schema,
            options,
            vec![Box::new(CollectSink(collected.clone()))],
        )
        .unwrap();
        (analyzer, collected)
    }

    fn not_stopped() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn decodes_checked_frames_to_end_of_input() {
        let mut bytes = vec![0x00, 0x73, 0x13];
        bytes.extend(good(&payload(1, 1.0)));
        bytes.extend(good(&payload(2, -3.5)));
        let (mut analyzer, collected) = analyzer(bytes, &AnalyzerOptions::default());

        let outcome = analyzer.run(&not_stopped()).unwrap();
        assert_eq!(outcome, Outcome::EndOfInput);

        let records = collected.records.borrow();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, 1);
        assert_eq!(records[0].get("seq"), Some(Value::U16(1)));
        assert_eq!(records[0].get("temp"), Some(Value::F32(1.0)));
        assert_eq!(records[1].get("temp"), Some(Value::F32(-3.5)));
        assert_eq!(*collected.flushes.borrow(), 1);
    }

    #[test]
    fn unchecked_frames_have_no_trailer() {
        let mut bytes = dtsmon_frame::MARKER.to_vec();
        bytes.extend_from_slice(&[0x01, 0x00, 0xFF, 0x00, 0x00, 0x80, 0x3F, 0x00]);
        let options = AnalyzerOptions {
            integrity: IntegrityConfig {
                enabled: false,
                ..IntegrityConfig::default()
            },
            ..AnalyzerOptions::default()
        };
        let (mut analyzer, collected) = analyzer(bytes, &options);

        analyzer.run(&not_stopped()).unwrap();
        let records = collected.records.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("seq"), Some(Value::U16(1)));
        assert_eq!(records[0].get("temp"), Some(Value::F32(1.0)));
    }

    #[test]
    fn ten_bad_frames_abort() {
        let bytes: Vec<u8> = (0..10).flat_map(|i| bad(&payload(i, 0.0))).collect();
        let (mut analyzer, collected) = analyzer(bytes, &AnalyzerOptions::default());

        let err = analyzer.run(&not_stopped()).unwrap_err();
        assert!(matches!(err, AnalyzerError::Integrity { failures: 10 }));
        assert!(collected.records.borrow().is_empty());
        assert_eq!(*collected.flushes.borrow(), 1);
    }

    #[test]
    fn nine_bad_then_good_continues() {
        let mut bytes: Vec<u8> = (0..9).flat_map(|i| bad(&payload(i, 0.0))).collect();
        bytes.extend(good(&payload(100, 2.0)));
        bytes.extend((0..9).flat_map(|i| bad(&payload(i, 0.0))));
        bytes.extend(good(&payload(101, 4.0)));
        let (mut analyzer, collected) = analyzer(bytes, &AnalyzerOptions::default());

        let outcome = analyzer.run(&not_stopped()).unwrap();
        assert_eq!(outcome, Outcome::EndOfInput);
        assert_eq!(analyzer.integrity_failures(), 18);

        let records = collected.records.borrow();
        let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![10, 20]);
    }

    #[test]
    fn single_shot_stops_after_count() {
        let bytes: Vec<u8> = (1..=5).flat_map(|i| good(&payload(i, 0.5))).collect();
        let options = AnalyzerOptions {
            single_shot: 3,
            ..AnalyzerOptions::default()
        };
        let (mut analyzer, collected) = analyzer(bytes, &options);

        let outcome = analyzer.run(&not_stopped()).unwrap();
        assert_eq!(outcome, Outcome::CountReached(3));
        assert_eq!(collected.records.borrow().len(), 3);
        assert_eq!(analyzer.dispatched(), 3);
    }

    #[test]
    fn shutdown_flag_stops_between_reads() {
        let bytes = good(&payload(1, 1.0));
        let (mut analyzer, collected) = analyzer(bytes, &AnalyzerOptions::default());

        let outcome = analyzer.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(outcome, Outcome::ShutDown);
        assert!(collected.records.borrow().is_empty());
        assert_eq!(*collected.flushes.borrow(), 1);
    }

    #[test]
    fn process_yields_none_until_frame_is_complete() {
        let bytes = good(&payload(7, 0.0));
        let (mut analyzer, _) = analyzer(bytes, &AnalyzerOptions::default());

        let record = loop {
            if let Some(record) = analyzer.process().unwrap() {
                break record;
            }
        };
        assert_eq!(record.get("seq"), Some(Value::U16(7)));
        assert!(matches!(
            analyzer.process(),
            Err(AnalyzerError::Transport(TransportError::Closed))
        ));
    }

    #[test]
    fn no_sinks_rejected() {
        let schema = Schema::from_json_str(LAYOUT).unwrap();
        let result = Analyzer::with_sinks(
            StreamSource::new(Cursor::new(Vec::new())),
            schema,
            &AnalyzerOptions::default(),
            Vec::new(),
        );
        assert!(matches!(result, Err(AnalyzerError::Config(_))));
    }

    #[test]
    fn no_output_option_rejected() {
        let schema = Schema::from_json_str(LAYOUT).unwrap();
        let options = AnalyzerOptions {
            terminal: false,
            ..AnalyzerOptions::default()
        };
        let result = Analyzer::new(StreamSource::new(Cursor::new(Vec::new())), schema, &options);
        assert!(matches!(result, Err(AnalyzerError::Config(_))));
    }

    #[test]
    fn log_file_receives_rows() {
        let dir = make_temp_dir("log-rows");
        let log = dir.join("run.csv");
        let options = AnalyzerOptions {
            terminal: false,
            log_path: Some(log.clone()),
            descriptor_path: PathBuf::from("layout.json"),
            ..AnalyzerOptions::default()
        };
        let bytes = [good(&payload(1, 1.0)), good(&payload(2, 2.5))].concat();
        let schema = Schema::from_json_str(LAYOUT).unwrap();

        let mut analyzer =
            Analyzer::new(StreamSource::new(Cursor::new(bytes)), schema, &options).unwrap();
        assert_eq!(analyzer.run(&not_stopped()).unwrap(), Outcome::EndOfInput);
        drop(analyzer);

        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(
            content,
            "# Log generated by dtsmon using layout descriptor: 'layout.json'\n\
             Frame,seq,temp\n\
             1,1,1.0\n\
             2,2,2.5\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn pipeline_dispatches_to_selected_variant() {
        let monitor = Monitor::new(
            StreamSource::new(Cursor::new(b"xy".to_vec())),
            Vec::new(),
            MonitorMode::Passthrough,
        );
        let mut pipeline: Pipeline<_, Vec<u8>> = Pipeline::Bytes(monitor);
        assert_eq!(pipeline.run(&not_stopped()).unwrap(), Outcome::EndOfInput);

        let (analyzer, collected) = analyzer(good(&payload(1, 1.0)), &AnalyzerOptions::default());
        let mut pipeline: Pipeline<_, Vec<u8>> = Pipeline::Frames(analyzer);
        assert_eq!(pipeline.run(&not_stopped()).unwrap(), Outcome::EndOfInput);
        assert_eq!(collected.records.borrow().len(), 1);
    }

    #[test]
    fn outcome_display() {
        assert_eq!(Outcome::CountReached(4).to_string(), "stopped after 4");
        assert_eq!(Outcome::EndOfInput.to_string(), "end of input");
    }

    fn make_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "dtsmon-run-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
