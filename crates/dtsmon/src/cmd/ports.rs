use dtsmon_transport::available_ports;
use serde::Serialize;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct PortOutput {
    name: String,
    kind: String,
    description: Option<String>,
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| transport_error("cannot list ports", err))?;

    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput> = ports
                .into_iter()
                .map(|port| PortOutput {
                    name: port.name,
                    kind: port.kind,
                    description: port.description,
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            if ports.is_empty() {
                println!("no serial ports found");
                return Ok(SUCCESS);
            }
            let mut table = table(&["PORT", "KIND", "DESCRIPTION"]);
            for port in ports {
                table.add_row(vec![
                    port.name,
                    port.kind,
                    port.description.unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(SUCCESS)
}
