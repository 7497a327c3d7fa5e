//! Reconstruct MBP-10 snapshots from an MBO CSV file.
//!
//! # Usage
//!
//! ```bash
//! # Default output file (output.csv)
//! cargo run --release --bin mbp10 -- data/mbo.csv
//!
//! # Custom output, only rows touching the top 10, run stats as JSON
//! cargo run --release --bin mbp10 -- data/mbo.csv -o mbp.csv \
//!     --window-only --stats stats.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mbp10_reconstructor::{
    replay_file, EmitPolicy, Mbp10Config, ReplayOptions, ReplaySummary, Result,
};

#[derive(Parser, Debug)]
#[command(name = "mbp10")]
#[command(about = "Reconstruct MBP-10 snapshots from an MBO event log")]
struct Args {
    /// Input MBO CSV file
    input: PathBuf,

    /// Output MBP-10 CSV file
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Processor configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Value written to the rtype column
    #[arg(long)]
    rtype: Option<u16>,

    /// Value written to the publisher_id column
    #[arg(long)]
    publisher_id: Option<u16>,

    /// Value written to the instrument_id column
    #[arg(long)]
    instrument_id: Option<u32>,

    /// Only emit rows for events touching the top 10 levels
    #[arg(long)]
    window_only: bool,

    /// Read the whole input into memory instead of streaming it
    #[arg(long)]
    materialize: bool,

    /// The input has no header line
    #[arg(long)]
    no_input_header: bool,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    stats: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<Mbp10Config> {
    let mut config = match &args.config {
        Some(path) => Mbp10Config::from_json_file(path)?,
        None => Mbp10Config::default(),
    };
    if let Some(rtype) = args.rtype {
        config.schema.rtype = rtype;
    }
    if let Some(publisher_id) = args.publisher_id {
        config.schema.publisher_id = publisher_id;
    }
    if let Some(instrument_id) = args.instrument_id {
        config.schema.instrument_id = instrument_id;
    }
    if args.window_only {
        config.emit_policy = EmitPolicy::WindowOnly;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<ReplaySummary> {
    let config = build_config(args)?;
    let options = ReplayOptions::default()
        .with_input_header(!args.no_input_header)
        .with_materialize(args.materialize);

    log::info!("Input: {}", args.input.display());
    log::debug!("Configuration: {config:?}");

    let summary = replay_file(&args.input, &args.output, config, options)?;
    if let Some(path) = &args.stats {
        summary.write_json(path)?;
        log::info!("Stats written to: {}", path.display());
    }
    Ok(summary)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(summary) => {
            println!("Processing completed successfully!");
            println!("Output written to: {}", args.output.display());
            println!("Processing time: {} ms", summary.elapsed.as_millis());
            println!(
                "Records: {}  Rows: {}  Suppressed: {}  Merged: {}",
                summary.records_read,
                summary.rows_written,
                summary.stats.suppressed.total(),
                summary.stats.merged_sequences
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
