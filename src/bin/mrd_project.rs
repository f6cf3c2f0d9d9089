//! mrd-project: Flatten MRD headers into flat record-store fields
//!
//! Input is the JSON dictionary form of an ISMRMRD header.
//!
//! Usage:
//!   # Read from file, output to stdout
//!   mrd-project header.json
//!
//!   # One header per line, records to a file
//!   mrd-project --ndjson headers.jsonl --output records.jsonl
//!
//!   # Show which paths survive filtering and the keys they map to
//!   mrd-project --paths header.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use mrd_flatten::project::flat_key;
use mrd_flatten::{
    CollisionPolicy, HeaderProjector, HeaderSource, JsonHeaderSource, ProjectionConfig,
    RecordSink, RecordWriter, NAMESPACE,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mrd-project")]
#[command(about = "Flatten MRD headers into flat record-store fields", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one header per line)
    #[arg(long)]
    ndjson: bool,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Maximum enumeration rounds before giving up (default: 64)
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Fail when two paths collapse onto the same flat key
    #[arg(long)]
    strict: bool,

    /// Start each record with the `scans` datatype entry
    #[arg(long)]
    datatype_marker: bool,

    /// Keep the aggregated coil label list instead of the placeholder
    #[arg(long)]
    keep_coil_labels: bool,

    /// Print surviving key-paths and their flat keys instead of records
    #[arg(long)]
    paths: bool,

    /// Pretty-print records
    #[arg(long)]
    pretty: bool,

    /// Comma-separated top-level groups every header must contain
    #[arg(long)]
    require: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = ProjectionConfig::default();
    if let Some(rounds) = args.max_rounds {
        config.max_rounds = rounds;
    }
    if args.strict {
        config.collisions = CollisionPolicy::Reject;
    }
    if args.keep_coil_labels {
        config.coil_label_placeholder = None;
    }
    config.datatype_marker = args.datatype_marker;

    let mut source = JsonHeaderSource::new();
    if let Some(groups) = &args.require {
        source = source.with_required(
            groups
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty()),
        );
    }

    let content = read_input(args.input.as_deref())?;
    let headers = split_headers(&content, args.ndjson);
    if headers.is_empty() {
        tracing::warn!("no headers found in input");
    }

    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {}", path))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    let projector = HeaderProjector::new(config);

    if args.paths {
        write_paths(output, &projector, &source, &headers)
    } else {
        write_records(output, &projector, &source, &headers, args.pretty)
    }
}

fn read_input(input: Option<&str>) -> Result<Vec<u8>> {
    let mut reader: Box<dyn Read> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input file: {}", path))?,
        )),
        None => Box::new(std::io::stdin()),
    };

    let mut content = Vec::new();
    reader.read_to_end(&mut content).context("Failed to read input")?;
    Ok(content)
}

/// Split input into raw headers: one per non-blank line for NDJSON,
/// otherwise the whole input
fn split_headers(content: &[u8], ndjson: bool) -> Vec<&[u8]> {
    if !ndjson {
        return if content.iter().all(u8::is_ascii_whitespace) {
            Vec::new()
        } else {
            vec![content]
        };
    }

    content
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .collect()
}

fn write_records(
    output: Box<dyn Write>,
    projector: &HeaderProjector,
    source: &JsonHeaderSource,
    headers: &[&[u8]],
    pretty: bool,
) -> Result<()> {
    let mut writer = RecordWriter::new(output).pretty(pretty);

    for (idx, raw) in headers.iter().enumerate() {
        let document = source
            .validate_and_parse(raw)
            .with_context(|| format!("Header {} failed validation", idx + 1))?;
        let record = projector
            .project(&document)
            .with_context(|| format!("Failed to project header {}", idx + 1))?;

        let handle = writer.create_record_with_fields(&record)?;
        tracing::info!(record = %handle.0, fields = record.len(), "record written");
    }

    writer.flush()
}

fn write_paths(
    mut output: Box<dyn Write>,
    projector: &HeaderProjector,
    source: &JsonHeaderSource,
    headers: &[&[u8]],
) -> Result<()> {
    for (idx, raw) in headers.iter().enumerate() {
        let document = source
            .validate_and_parse(raw)
            .with_context(|| format!("Header {} failed validation", idx + 1))?;
        let (paths, _) = projector
            .surviving_paths(&document)
            .with_context(|| format!("Failed to filter header {}", idx + 1))?;

        if headers.len() > 1 {
            writeln!(output, "# header {}", idx + 1)?;
        }
        for path in &paths {
            writeln!(output, "{}\t{}", path, flat_key(NAMESPACE, path))?;
        }
    }

    output.flush().context("Failed to flush output")
}
