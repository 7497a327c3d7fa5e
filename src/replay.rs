//! Replay driver: source → collapser → processor → sink.
//!
//! The [`Replayer`] owns the dense, zero-based row index. Suppressed records
//! never consume an index.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::collapse::{Decision, SequenceCollapser};
use crate::error::{MbpError, Result};
use crate::lob::{Mbp10Config, Mbp10Reconstructor, ReconStats};
use crate::record::MboRecord;
use crate::snapshot::{csv_header, Snapshot};
use crate::source::{LineSource, RecordSource, VecSource};

// ============================================================================
// Sinks
// ============================================================================

/// Destination for emitted rows.
pub trait RowSink {
    /// Accept one row with its index.
    fn accept(&mut self, index: u64, snapshot: &Snapshot<'_>) -> Result<()>;

    /// Called once after the last row.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects encoded rows (without header) in memory.
impl RowSink for Vec<String> {
    fn accept(&mut self, index: u64, snapshot: &Snapshot<'_>) -> Result<()> {
        self.push(snapshot.to_csv(index));
        Ok(())
    }
}

/// Writes the header followed by one line per row.
///
/// The header is written even when no row is emitted.
pub struct CsvSink<W: Write> {
    writer: W,
    buf: String,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: String::with_capacity(512),
            header_written: false,
        }
    }

    /// Unwrap the writer. Does not flush.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.header_written {
            self.writer.write_all(csv_header().as_bytes())?;
            self.writer.write_all(b"\n")?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl CsvSink<BufWriter<File>> {
    /// Create (or truncate) a file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn accept(&mut self, index: u64, snapshot: &Snapshot<'_>) -> Result<()> {
        self.write_header()?;
        self.buf.clear();
        snapshot
            .write_csv(index, &mut self.buf)
            .map_err(|_| MbpError::generic("failed to encode row"))?;
        self.buf.push('\n');
        self.writer.write_all(self.buf.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.write_header()?;
        self.writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// Replay Summary
// ============================================================================

/// Outcome of one replay run.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    /// Source description (path or provider)
    pub source: String,

    /// Raw records read from the source
    pub records_read: u64,

    /// Rows handed to the sink
    pub rows_written: u64,

    /// Wall-clock time of the run
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,

    /// Processor statistics at the end of the run
    pub stats: ReconStats,
}

impl ReplaySummary {
    /// Records read per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records_read as f64 / secs
        } else {
            0.0
        }
    }

    /// Write the summary as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

fn serialize_millis<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// Replayer
// ============================================================================

/// Drives a source through the collapser and the event processor.
#[derive(Debug, Clone, Default)]
pub struct Replayer {
    reconstructor: Mbp10Reconstructor,
    collapser: SequenceCollapser,
    next_index: u64,
}

impl Replayer {
    /// Create a replayer with the given processor configuration.
    pub fn new(config: Mbp10Config) -> Self {
        Self {
            reconstructor: Mbp10Reconstructor::with_config(config),
            collapser: SequenceCollapser::new(),
            next_index: 0,
        }
    }

    /// The underlying processor.
    pub fn reconstructor(&self) -> &Mbp10Reconstructor {
        &self.reconstructor
    }

    /// Index the next emitted row will get.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Start over: empty book, nothing pending, index back to zero.
    pub fn reset(&mut self) {
        self.reconstructor.reset();
        self.collapser.reset();
        self.next_index = 0;
    }

    /// Replay every record of `source` into `sink`.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<ReplaySummary>
    where
        S: RecordSource + ?Sized,
        K: RowSink + ?Sized,
    {
        let start = Instant::now();
        let description = source.metadata().describe();
        let first_index = self.next_index;
        let mut records_read = 0u64;
        log::info!("Replaying {description}");

        while source.advance()? {
            let decision = self.collapser.decide(&*source);
            let Some(line) = source.peek(0) else {
                break;
            };
            records_read += 1;

            match decision {
                Decision::Process => {
                    let snapshot = self.reconstructor.process_line(line);
                    self.emit(snapshot, sink)?;
                }
                Decision::Suppress(reason) => self.reconstructor.record_skip(reason),
                Decision::Merge { trade } => {
                    // A Cancel that fails to parse is suppressed along with
                    // the held Trade.
                    let snapshot = match (MboRecord::parse(&trade), MboRecord::parse(line)) {
                        (Ok(trade), Ok(cancel)) => {
                            self.reconstructor.process_merged(&trade, &cancel)
                        }
                        (Err(_), Ok(cancel)) => self.reconstructor.process(&cancel),
                        (_, Err(_)) => self.reconstructor.process_line(line),
                    };
                    self.emit(snapshot, sink)?;
                }
            }
        }
        sink.finish()?;

        let summary = ReplaySummary {
            source: description,
            records_read,
            rows_written: self.next_index - first_index,
            elapsed: start.elapsed(),
            stats: self.reconstructor.stats().clone(),
        };
        log::info!(
            "Replayed {} records into {} rows in {:.3}s ({:.0} rec/s, {} suppressed, {} merged)",
            summary.records_read,
            summary.rows_written,
            summary.elapsed.as_secs_f64(),
            summary.throughput(),
            summary.stats.suppressed.total(),
            summary.stats.merged_sequences
        );
        Ok(summary)
    }

    fn emit<K: RowSink + ?Sized>(
        &mut self,
        snapshot: Option<Snapshot<'_>>,
        sink: &mut K,
    ) -> Result<()> {
        if let Some(snapshot) = snapshot {
            sink.accept(self.next_index, &snapshot)?;
            self.next_index += 1;
        }
        Ok(())
    }
}

// ============================================================================
// File Replay
// ============================================================================

/// Input handling options for [`replay_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Skip the first input line
    pub input_header: bool,

    /// Read the whole input into memory instead of streaming
    pub materialize: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            input_header: true,
            materialize: false,
        }
    }
}

impl ReplayOptions {
    /// Set whether the input starts with a header line.
    pub fn with_input_header(mut self, header: bool) -> Self {
        self.input_header = header;
        self
    }

    /// Set whether to materialize the input.
    pub fn with_materialize(mut self, materialize: bool) -> Self {
        self.materialize = materialize;
        self
    }
}

/// Replay an MBO CSV file into an MBP-10 CSV file.
pub fn replay_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: Mbp10Config,
    options: ReplayOptions,
) -> Result<ReplaySummary> {
    let mut sink = CsvSink::create(output)?;
    let mut replayer = Replayer::new(config);
    if options.materialize {
        let mut source = VecSource::from_path(input, options.input_header)?;
        replayer.run(&mut source, &mut sink)
    } else {
        let mut source = LineSource::open(input, options.input_header)?;
        replayer.run(&mut source, &mut sink)
    }
}
