//! Record sources with bounded lookahead.
//!
//! The collapser needs to see the record at the cursor and up to
//! [`LOOKAHEAD`] records after it. A [`RecordSource`] exposes exactly that:
//! a forward-only cursor plus `peek(offset)` for `offset` in `0..=LOOKAHEAD`.
//!
//! Two implementations are provided:
//!
//! - [`VecSource`]: all lines held in memory
//! - [`LineSource`]: streams from any `BufRead`, holding only the window
//!
//! A line that is not valid UTF-8 is replaced by an empty line, which the
//! record parser rejects as malformed. One bad line never ends a replay.
//!
//! # Example
//!
//! ```
//! use mbp10_reconstructor::source::{RecordSource, VecSource};
//!
//! let mut source = VecSource::from_text("header\nfirst\nsecond\n", true);
//! assert!(source.advance().unwrap());
//! assert_eq!(source.peek(0), Some("first"));
//! assert_eq!(source.peek(1), Some("second"));
//! assert_eq!(source.peek(2), None);
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::LOOKAHEAD;

// ============================================================================
// Source Metadata
// ============================================================================

/// Metadata about a record source, used for logging and summaries.
#[derive(Debug, Clone, Default)]
pub struct SourceMetadata {
    /// Source file path (if loaded from file)
    pub file_path: Option<PathBuf>,

    /// Provider name (e.g., "memory", "file")
    pub provider: Option<String>,

    /// Known record count, when the source is materialized
    pub estimated_records: Option<u64>,

    /// File size in bytes (if applicable)
    pub file_size: Option<u64>,

    /// Whether a header line was skipped
    pub header_skipped: bool,
}

impl SourceMetadata {
    /// Create new empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file path.
    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the known record count.
    pub fn with_estimated_records(mut self, count: u64) -> Self {
        self.estimated_records = Some(count);
        self
    }

    /// Metadata for a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut metadata = Self::new().with_file_path(path).with_provider("file");
        if let Ok(meta) = std::fs::metadata(path) {
            metadata.file_size = Some(meta.len());
        }
        metadata
    }

    /// Short human-readable description.
    pub fn describe(&self) -> String {
        match (&self.file_path, &self.provider) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(provider)) => provider.clone(),
            (None, None) => "<unknown>".to_string(),
        }
    }
}

// ============================================================================
// Record Source Trait
// ============================================================================

/// Forward-only cursor over raw input records with bounded lookahead.
///
/// The cursor starts before the first record. After `advance()` returns
/// `true`, `peek(0)` is the current record and `peek(k)` the k-th record
/// after it. Offsets beyond [`LOOKAHEAD`] may return `None` even when more
/// records exist.
pub trait RecordSource {
    /// Move to the next record. Returns `false` once the input is exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Record at `cursor + offset`, if any.
    fn peek(&self, offset: usize) -> Option<&str>;

    /// Information about the source.
    fn metadata(&self) -> &SourceMetadata;
}

// ============================================================================
// Vector Source
// ============================================================================

/// A materialized in-memory source.
///
/// Useful for unit tests and for the `--materialize` mode of the CLI.
#[derive(Debug, Clone)]
pub struct VecSource {
    lines: Vec<String>,
    current: Option<usize>,
    metadata: SourceMetadata,
}

impl VecSource {
    /// Create a source over already-split lines (no header).
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            metadata: SourceMetadata::new()
                .with_provider("memory")
                .with_estimated_records(lines.len() as u64),
            lines,
            current: None,
        }
    }

    /// Split `text` into lines, optionally dropping the first as a header.
    pub fn from_text(text: &str, has_header: bool) -> Self {
        let skip = usize::from(has_header);
        let lines = text.lines().skip(skip).map(str::to_string).collect();
        let mut source = Self::new(lines);
        source.metadata.header_skipped = has_header;
        source
    }

    /// Read a whole file into memory.
    pub fn from_path(path: impl AsRef<Path>, has_header: bool) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        let mut raw: Vec<&[u8]> = bytes.split(|&b| b == b'\n').collect();
        if bytes.is_empty() || bytes.ends_with(b"\n") {
            raw.pop();
        }
        let lines = raw
            .into_iter()
            .enumerate()
            .skip(usize::from(has_header))
            .map(|(i, line)| decode_line(line.to_vec(), i as u64 + 1))
            .collect();

        let source = Self::new(lines);
        let metadata = SourceMetadata {
            header_skipped: has_header,
            estimated_records: Some(source.lines.len() as u64),
            ..SourceMetadata::from_path(path)
        };
        Ok(source.with_metadata(metadata))
    }

    /// Set custom metadata.
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the source holds no records.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl RecordSource for VecSource {
    fn advance(&mut self) -> Result<bool> {
        let next = self.current.map_or(0, |i| i + 1).min(self.lines.len());
        self.current = Some(next);
        Ok(next < self.lines.len())
    }

    fn peek(&self, offset: usize) -> Option<&str> {
        let index = self.current?.checked_add(offset)?;
        self.lines.get(index).map(String::as_str)
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}

// ============================================================================
// Streaming Line Source
// ============================================================================

/// Streams lines from a reader, keeping only the lookahead window in memory.
///
/// Line terminators (`\n` or `\r\n`) are stripped.
pub struct LineSource<R: BufRead> {
    reader: R,
    window: VecDeque<String>,
    started: bool,
    exhausted: bool,
    /// Physical lines read so far, header included
    lines_read: u64,
    metadata: SourceMetadata,
}

impl<R: BufRead> LineSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            window: VecDeque::with_capacity(LOOKAHEAD + 1),
            started: false,
            exhausted: false,
            lines_read: 0,
            metadata: SourceMetadata::new().with_provider("stream"),
        }
    }

    /// Consume and discard the first line.
    pub fn skip_header(mut self) -> Result<Self> {
        if !self.started && self.window.is_empty() {
            let mut header = Vec::new();
            if self.reader.read_until(b'\n', &mut header)? > 0 {
                self.lines_read += 1;
            }
            self.metadata.header_skipped = true;
        }
        Ok(self)
    }

    /// Set custom metadata.
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    fn fill(&mut self) -> Result<()> {
        while self.window.len() <= LOOKAHEAD && !self.exhausted {
            let mut raw = Vec::new();
            if self.reader.read_until(b'\n', &mut raw)? == 0 {
                self.exhausted = true;
                break;
            }
            self.lines_read += 1;
            if raw.ends_with(b"\n") {
                raw.pop();
            }
            self.window.push_back(decode_line(raw, self.lines_read));
        }
        Ok(())
    }
}

/// Strip a trailing `\r` and decode as UTF-8. Undecodable lines become empty.
fn decode_line(mut raw: Vec<u8>, line_number: u64) -> String {
    if raw.ends_with(b"\r") {
        raw.pop();
    }
    match String::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => {
            log::warn!("Line {line_number} is not valid UTF-8 ({e}), skipping");
            String::new()
        }
    }
}

impl LineSource<BufReader<File>> {
    /// Open a file for streaming.
    pub fn open(path: impl AsRef<Path>, has_header: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let source =
            Self::new(BufReader::new(file)).with_metadata(SourceMetadata::from_path(path));
        if has_header {
            source.skip_header()
        } else {
            Ok(source)
        }
    }
}

impl<R: BufRead> RecordSource for LineSource<R> {
    fn advance(&mut self) -> Result<bool> {
        if self.started {
            self.window.pop_front();
        }
        self.started = true;
        self.fill()?;
        Ok(!self.window.is_empty())
    }

    fn peek(&self, offset: usize) -> Option<&str> {
        if !self.started {
            return None;
        }
        self.window.get(offset).map(String::as_str)
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}
