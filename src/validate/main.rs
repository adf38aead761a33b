//! Address list checker.
//!
//! Reads `id_code, street, postal_code, city, province` rows and reports
//! every record that fails validation.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use postal_closure::address::{province_name, AddressField, AddressReport, ItalianAddressValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "validate-addresses")]
#[command(about = "Validate Italian postal addresses from a CSV file")]
struct Args {
    /// Address CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// Treat the first row as a header
    #[arg(long)]
    has_headers: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn read_rows<R: Read>(reader: R, has_headers: bool) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read record {}", i))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// `CITY (Province)` heading for a record, when the row has those fields
fn record_label(row: &[String]) -> Option<String> {
    let city = row.get(3)?;
    let province = row.get(4)?;
    Some(match province_name(province) {
        Some(name) => format!("{} ({})", city, name),
        None => format!("{} ({})", city, province),
    })
}

/// Issue messages keyed by record index, then field
fn to_messages(
    results: &BTreeMap<usize, AddressReport>,
) -> BTreeMap<usize, BTreeMap<AddressField, Vec<String>>> {
    results
        .iter()
        .map(|(&idx, report)| {
            let fields = report
                .iter()
                .map(|(&field, issues)| (field, issues.iter().map(ToString::to_string).collect()))
                .collect();
            (idx, fields)
        })
        .collect()
}

fn main() -> Result<ExitCode> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let rows = read_rows(file, args.has_headers)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let validator = ItalianAddressValidator::new();
    let results = validator.validate_all(&rows);
    info!(
        "Checked {} records, {} invalid",
        rows.len(),
        results.len()
    );

    let messages = to_messages(&results);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => {
            for (idx, fields) in &messages {
                match rows.get(*idx).and_then(|row| record_label(row)) {
                    Some(label) => writeln!(out, "Record {} - {}:", idx, label)?,
                    None => writeln!(out, "Record {}:", idx)?,
                }
                for issue in fields.values().flatten() {
                    writeln!(out, "  - {}", issue)?;
                }
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &messages)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    if results.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
