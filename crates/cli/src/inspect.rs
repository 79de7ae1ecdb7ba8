//! `sgrid inspect` — show what the parsers extract from one feed.

use std::path::PathBuf;

use clap::Subcommand;
use sensorgrid_recon::model::SensorMap;
use sensorgrid_recon::tabular::parse_tabular_lines;
use sensorgrid_recon::extract_structured;

use crate::sources::{read_json, read_text};
use crate::CliError;

#[derive(Subcommand)]
pub enum InspectCommands {
    /// Parse a pipe-delimited sensor listing
    #[command(after_help = "\
Examples:
  ipmitool sensor list > sensors.txt && sgrid inspect tabular sensors.txt
  sgrid inspect tabular sensors.txt --json")]
    Tabular {
        /// Sensor listing file
        file: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Extract readings from thermal / power JSON documents
    #[command(after_help = "\
Examples:
  sgrid inspect structured --thermal thermal.json --power power.json")]
    Structured {
        /// Thermal document (Temperatures[])
        #[arg(long)]
        thermal: Option<PathBuf>,

        /// Power document (Voltages[])
        #[arg(long)]
        power: Option<PathBuf>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_inspect(cmd: InspectCommands) -> Result<(), CliError> {
    match cmd {
        InspectCommands::Tabular { file, json } => cmd_inspect_tabular(file, json),
        InspectCommands::Structured { thermal, power, json } => {
            cmd_inspect_structured(thermal, power, json)
        }
    }
}

fn cmd_inspect_tabular(file: PathBuf, json: bool) -> Result<(), CliError> {
    let text = read_text(&file)?;
    let parse = parse_tabular_lines(&text);

    if json {
        return print_json(&parse);
    }

    print_readings(&parse.readings);
    eprintln!(
        "{} sensors ({} malformed lines, {} without reading, {} duplicate names)",
        parse.readings.len(),
        parse.malformed_lines,
        parse.no_reading_lines,
        parse.duplicate_names,
    );
    Ok(())
}

fn cmd_inspect_structured(
    thermal: Option<PathBuf>,
    power: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    if thermal.is_none() && power.is_none() {
        return Err(CliError::args("at least one of --thermal or --power is required"));
    }

    let thermal = thermal.as_deref().map(read_json).transpose()?;
    let power = power.as_deref().map(read_json).transpose()?;
    let readings = extract_structured(thermal.as_ref(), power.as_ref());

    if json {
        return print_json(&readings);
    }

    print_readings(&readings);
    eprintln!("{} sensors", readings.len());
    Ok(())
}

fn print_readings(readings: &SensorMap) {
    for r in readings {
        let value = r.value.map_or_else(|| "n/a".to_string(), |v| v.to_string());
        let unit = r.unit.map(|u| format!(" {u:?}")).unwrap_or_default();
        let status = r.status.as_deref().map(|s| format!("  [{s}]")).unwrap_or_default();
        println!("{:<24} {value}{unit}{status}", r.name);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
    println!("{json_str}");
    Ok(())
}
