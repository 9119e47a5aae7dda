use serde::Serialize;

use crate::cmd::analyze::load_schema;
use crate::cmd::DescribeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Serialize)]
struct FieldOutput<'a> {
    label: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    offset: usize,
    width: usize,
    padding: bool,
}

#[derive(Serialize)]
struct DescribeOutput<'a> {
    descriptor: String,
    endianness: &'static str,
    payload_size: usize,
    fields: Vec<FieldOutput<'a>>,
}

pub fn run(args: DescribeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_schema(&args.desc, args.allow_odd_payload)?;

    let fields: Vec<FieldOutput<'_>> = schema
        .offsets()
        .map(|(offset, field)| FieldOutput {
            label: field.label.as_ref(),
            kind: field.kind.tag(),
            offset,
            width: field.width(),
            padding: field.kind.is_padding(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&DescribeOutput {
            descriptor: args.desc.display().to_string(),
            endianness: schema.endianness().tag(),
            payload_size: schema.payload_size(),
            fields,
        }),
        OutputFormat::Table => {
            let mut table = table(&["LABEL", "TYPE", "OFFSET", "WIDTH"]);
            for field in &fields {
                let label = if field.padding { "(padding)" } else { field.label };
                table.add_row(vec![
                    label.to_string(),
                    field.kind.to_string(),
                    field.offset.to_string(),
                    field.width.to_string(),
                ]);
            }
            println!("{table}");
            println!(
                "payload: {} bytes, {} endian",
                schema.payload_size(),
                schema.endianness().tag()
            );
        }
    }

    Ok(SUCCESS)
}
