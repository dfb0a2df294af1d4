//! SEG-D decoder CLI application.
//!
//! Decodes a SEG-D field file and persists the parsed artifacts: the
//! raw header block, per-trace raw headers, and the sample matrix as a
//! text table.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use segd_core::{output, SegdDecoder, SegdRecord};
use std::path::PathBuf;
use std::time::Instant;

/// SEG-D field file decoder (32-bit IEEE demultiplexed, SERCEL headers).
///
/// Writes three artifacts under the output directory: <stem>.hdr_block
/// (raw header bytes), trace_headers/<stem>.trace_<i>.headers (raw
/// per-trace header bytes), and <stem>.trace_data (sample matrix, one
/// text line per trace).
#[derive(Parser, Debug)]
#[command(name = "segd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input SEG-D file path
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (default: parsed/<stem> next to the input)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print the interpreted headers to stdout
    #[arg(long)]
    headers: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Input path has no file name")?
        .to_string();

    let output_dir = match &args.output {
        Some(dir) => dir.join(&stem),
        None => args
            .input
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("parsed")
            .join(&stem),
    };

    // Setup progress bar
    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.set_message("Decoding...");
        pb
    };

    let start_time = Instant::now();

    progress.set_message(format!(
        "Decoding {:?}...",
        args.input.file_name().unwrap_or_default()
    ));

    let mut decoder = SegdDecoder::new();
    let record = decoder
        .decode_file(&args.input)
        .context("Failed to decode SEG-D file")?;

    let decode_duration = start_time.elapsed();

    if !args.quiet {
        progress.set_message(format!(
            "Decoded {} traces of {} samples in {:.2}s",
            record.matrix.rows(),
            record.matrix.cols(),
            decode_duration.as_secs_f64()
        ));
    }

    if args.headers {
        progress.suspend(|| print_headers(&record));
    }

    progress.set_message(format!("Writing to {output_dir:?}..."));

    output::write_record(&output_dir, &stem, &record)
        .context("Failed to write parsed artifacts")?;

    let total_duration = start_time.elapsed();

    progress.finish_with_message(format!(
        "Done! Wrote {} traces to {:?} in {:.2}s",
        record.matrix.rows(),
        output_dir,
        total_duration.as_secs_f64()
    ));

    if !args.quiet {
        let sample_rate_hz = if record.extended.sample_rate_us > 0 {
            1e6 / record.extended.sample_rate_us as f64
        } else {
            0.0
        };
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", args.input);
        eprintln!("  Output:       {output_dir:?}");
        eprintln!("  File number:  {}", record.general.file_number);
        eprintln!("  Shot time:    {}", record.general.time);
        eprintln!("  Traces:       {}", record.matrix.rows());
        eprintln!("  Samples:      {}", record.matrix.cols());
        eprintln!("  Sample rate:  {sample_rate_hz:.1} Hz");
        eprintln!("  Channel sets: {}", record.scan_types.len());
        eprintln!("  Integer data: {}", record.matrix.is_integral());
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
    }

    Ok(())
}

/// Prints the interpreted headers, one `name: value` line per field,
/// in stream declaration order.
fn print_headers(record: &SegdRecord) {
    println!("*** GENERAL HEADER:");
    for (name, value) in record.general.fields() {
        println!("{name}: {value}");
    }
    for (channel_set, sch) in &record.scan_types {
        println!("*** SCAN TYPE HEADER {channel_set}:");
        for (name, value) in sch.fields() {
            println!("{name}: {value}");
        }
    }
    println!("*** EXTENDED HEADER:");
    for (name, value) in record.extended.fields() {
        println!("{name}: {value}");
    }
    println!("*** EXTERNAL HEADER:");
    println!("{}", record.external_text.as_deref().unwrap_or(""));
    if let Some(trace) = record.traces.first() {
        println!("*** TRACE HEADER 1:");
        for (name, value) in trace.header.fields() {
            println!("{name}: {value}");
        }
    }
}
