//! # MBP-10 Reconstructor
//!
//! Rebuilds a 10-level market-by-price (MBP-10) view from a market-by-order
//! (MBO) event log, emitting one snapshot row per admissible event.
//!
//! ## Features
//!
//! - **Exact prices**: `rust_decimal` keys, so `10.50` and `10.5` are one level
//! - **Pre-mutation depth**: the row reports where the event landed, the
//!   levels report the book after it
//! - **Sequence collapsing**: Trade → Fill → Cancel executions become one row
//! - **Streaming**: only a five-record window is held in memory
//! - **Lenient input**: malformed records are counted and skipped, never fatal
//!
//! ## Quick Start
//!
//! ```rust
//! use mbp10_reconstructor::{Mbp10Config, Replayer, VecSource};
//!
//! let input = "\
//! ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,size,channel_id,order_id,flags,ts_in_delta,sequence,symbol
//! r0,e0,160,2,1108,A,B,10.50,100,0,1,130,0,1,ARL
//! r1,e1,160,2,1108,A,A,10.60,40,0,2,130,0,2,ARL
//! ";
//!
//! let mut source = VecSource::from_text(input, true);
//! let mut rows: Vec<String> = Vec::new();
//! let summary = Replayer::new(Mbp10Config::default())
//!     .run(&mut source, &mut rows)
//!     .unwrap();
//!
//! assert_eq!(summary.rows_written, 2);
//! assert!(rows[1].starts_with("1,e1,e1,10,2,1108,A,A,0,10.6,40,130,0,2,10.5,100,1,10.6,40,1,"));
//! ```
//!
//! ### Processing records directly
//!
//! ```rust
//! use mbp10_reconstructor::{Mbp10Reconstructor, Side};
//!
//! let mut lob = Mbp10Reconstructor::new();
//! lob.process_line("r,e,160,2,1108,A,B,10.50,100,0,1,130,0,1,ARL");
//! let snap = lob
//!     .process_line("r,e,160,2,1108,A,B,10.50,50,0,2,130,0,2,ARL")
//!     .unwrap();
//!
//! assert_eq!(snap.side, Side::Bid);
//! assert_eq!(snap.depth, 0);
//! assert_eq!(snap.levels.bids[0].unwrap().size, 150);
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | `Action`, `Side`, `Price`, `SkipReason`, constants |
//! | [`record`] | Parsing of raw MBO lines |
//! | [`lob`] | Book state and the event processor |
//! | [`collapse`] | Trade → Fill → Cancel detection |
//! | [`snapshot`] | MBP-10 rows and their CSV encoding |
//! | [`source`] | Record sources with lookahead |
//! | [`replay`] | Replay driver and row sinks |

pub mod collapse;
pub mod error;
pub mod lob;
pub mod record;
pub mod replay;
pub mod snapshot;
pub mod source;
pub mod types;

// Re-exports - Core types
pub use error::{MbpError, Result};
pub use types::{Action, Order, Price, Side, SkipReason, LOOKAHEAD, MBP_LEVELS};

// Re-exports - Book and processor
pub use lob::{
    Book, EmitPolicy, Ladder, Mbp10Config, Mbp10Reconstructor, PriceLevel, ReconStats,
};

// Re-exports - Records and rows
pub use collapse::{Decision, SequenceCollapser};
pub use record::MboRecord;
pub use snapshot::{csv_header, DepthLevels, LevelView, SchemaIds, Snapshot};

// Re-exports - I/O
pub use replay::{replay_file, CsvSink, ReplayOptions, ReplaySummary, Replayer, RowSink};
pub use source::{LineSource, RecordSource, SourceMetadata, VecSource};
