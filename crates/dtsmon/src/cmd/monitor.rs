use dtsmon_analyzer::{Monitor, MonitorMode, Pipeline};

use crate::cmd::{run_pipeline, MonitorArgs};
use crate::exit::CliResult;

pub fn run(args: MonitorArgs) -> CliResult<i32> {
    let mode = MonitorMode::from(args.mode);
    let source = args.source.open()?;
    let monitor = Monitor::new(source, std::io::stdout(), mode).with_single_shot(args.single);

    run_pipeline(Pipeline::Bytes(monitor))
}
