//! Event processor: applies MBO events to the book and produces rows.
//!
//! | Action | Book effect | Row |
//! |--------|-------------|-----|
//! | Reset  | clear everything | yes |
//! | Add    | rest the order (if side defined) | yes |
//! | Cancel | cancel up to `size` (if side defined) | yes |
//! | Trade  | none | yes |
//! | Fill   | none | never |
//!
//! Depth is located before the mutation; the levels in the row are read
//! after it. Nothing here returns an error: malformed records are counted and
//! dropped.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::book::{AddOutcome, Book, CancelOutcome};
use crate::error::{MbpError, Result};
use crate::record::MboRecord;
use crate::snapshot::{SchemaIds, Snapshot};
use crate::types::{Action, Price, Side, SkipReason};

/// Which admissible events produce a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitPolicy {
    /// Every admissible event emits (default)
    #[default]
    All,
    /// Only events touching the top-10 window, judged before the mutation
    WindowOnly,
}

/// Configuration for the event processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mbp10Config {
    /// Constants written into the rtype/publisher/instrument columns
    pub schema: SchemaIds,

    /// Row emission policy
    pub emit_policy: EmitPolicy,

    /// Whether to log every suppressed record at debug level
    pub log_suppressed: bool,
}

impl Default for Mbp10Config {
    fn default() -> Self {
        Self {
            schema: SchemaIds::default(),
            emit_policy: EmitPolicy::All,
            log_suppressed: true,
        }
    }
}

impl Mbp10Config {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema constants.
    pub fn with_schema(mut self, schema: SchemaIds) -> Self {
        self.schema = schema;
        self
    }

    /// Set the emission policy.
    pub fn with_emit_policy(mut self, policy: EmitPolicy) -> Self {
        self.emit_policy = policy;
        self
    }

    /// Enable/disable suppression logs.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_suppressed = log;
        self
    }

    /// Load from a JSON file; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(MbpError::from)
    }
}

/// Per-reason suppression counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionCounts {
    pub malformed: u64,
    pub unknown_action: u64,
    pub invalid_number: u64,
    pub fill: u64,
    pub collapsed_trade: u64,
    pub outside_window: u64,
}

impl SuppressionCounts {
    /// Count one suppression.
    pub fn record(&mut self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::Malformed => &mut self.malformed,
            SkipReason::UnknownAction => &mut self.unknown_action,
            SkipReason::InvalidNumber => &mut self.invalid_number,
            SkipReason::Fill => &mut self.fill,
            SkipReason::CollapsedTrade => &mut self.collapsed_trade,
            SkipReason::OutsideWindow => &mut self.outside_window,
        };
        *counter += 1;
    }

    /// Count for one reason.
    pub fn get(&self, reason: SkipReason) -> u64 {
        match reason {
            SkipReason::Malformed => self.malformed,
            SkipReason::UnknownAction => self.unknown_action,
            SkipReason::InvalidNumber => self.invalid_number,
            SkipReason::Fill => self.fill,
            SkipReason::CollapsedTrade => self.collapsed_trade,
            SkipReason::OutsideWindow => self.outside_window,
        }
    }

    /// All suppressions.
    pub fn total(&self) -> u64 {
        self.malformed
            + self.unknown_action
            + self.invalid_number
            + self.fill
            + self.collapsed_trade
            + self.outside_window
    }
}

/// Statistics for monitoring a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconStats {
    /// Records handed to the processor (merged sequences count once)
    pub records_processed: u64,

    /// Rows produced
    pub rows_emitted: u64,

    /// Suppressed records by reason
    pub suppressed: SuppressionCounts,

    /// Trade/Fill/Cancel sequences emitted as one row
    pub merged_sequences: u64,

    /// Reset events applied
    pub resets: u64,

    /// Cancels for ids not on the book
    pub unknown_cancels: u64,

    /// Cancels larger than the resting size
    pub clamped_cancels: u64,

    /// Adds that reused a resting order id
    pub replaced_orders: u64,

    /// Resting orders after the last event
    pub active_orders: usize,

    /// Bid levels after the last event
    pub bid_levels: usize,

    /// Ask levels after the last event
    pub ask_levels: usize,
}

/// MBO → MBP-10 event processor.
#[derive(Debug, Clone, Default)]
pub struct Mbp10Reconstructor {
    config: Mbp10Config,
    book: Book,
    stats: ReconStats,
}

impl Mbp10Reconstructor {
    /// Create a processor with the default configuration.
    ///
    /// # Example
    /// ```
    /// use mbp10_reconstructor::Mbp10Reconstructor;
    ///
    /// let mut lob = Mbp10Reconstructor::new();
    /// let row = lob
    ///     .process_line("r,e,160,2,1108,A,B,10.50,100,0,1,130,0,1,ARL")
    ///     .map(|snap| snap.to_csv(0));
    /// assert!(row.unwrap().starts_with("0,e,e,10,2,1108,A,B,0,10.5,100,"));
    /// ```
    pub fn new() -> Self {
        Self::with_config(Mbp10Config::default())
    }

    /// Create a processor with a custom configuration.
    pub fn with_config(config: Mbp10Config) -> Self {
        Self {
            config,
            book: Book::new(),
            stats: ReconStats::default(),
        }
    }

    /// Current configuration.
    #[inline]
    pub fn config(&self) -> &Mbp10Config {
        &self.config
    }

    /// Current book.
    #[inline]
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Current statistics.
    #[inline]
    pub fn stats(&self) -> &ReconStats {
        &self.stats
    }

    /// Parse and process one raw record.
    pub fn process_line<'a>(&mut self, line: &'a str) -> Option<Snapshot<'a>> {
        match MboRecord::parse(line) {
            Ok(record) => self.process(&record),
            Err(e) => {
                self.stats.records_processed += 1;
                self.suppress(e.skip_reason(), &e);
                None
            }
        }
    }

    /// Apply one event and return the row it produces, if any.
    pub fn process<'a>(&mut self, record: &MboRecord<'a>) -> Option<Snapshot<'a>> {
        self.stats.records_processed += 1;

        if record.action == Action::Fill {
            self.suppress(SkipReason::Fill, &"fill");
            return None;
        }

        let depth = self
            .book
            .depth_before(record.action, record.side, record.price);
        let in_window = self.in_window(record.action, record.side, record.price);
        self.apply(record);
        self.emit(record, record.side, depth, in_window)
    }

    /// Emit one row for a collapsed Trade → Fill → Cancel sequence.
    ///
    /// The Cancel drives the book mutation and the depth; the Trade supplies
    /// the descriptive fields, with its side replaced by the Cancel's.
    pub fn process_merged<'a>(
        &mut self,
        trade: &MboRecord<'a>,
        cancel: &MboRecord<'_>,
    ) -> Option<Snapshot<'a>> {
        if cancel.action != Action::Cancel {
            return self.process(trade);
        }
        self.stats.records_processed += 1;
        self.stats.merged_sequences += 1;
        log::trace!(
            "Merging trade seq={} into cancel of order {} ({} @ {})",
            trade.sequence,
            cancel.order_id,
            cancel.size,
            cancel.price
        );

        let depth = self
            .book
            .depth_before(Action::Cancel, cancel.side, cancel.price);
        let in_window = self.in_window(Action::Cancel, cancel.side, cancel.price);
        self.apply(cancel);
        self.emit(trade, cancel.side, depth, in_window)
    }

    /// Count a record dropped before it reached the processor.
    pub fn record_skip(&mut self, reason: SkipReason) {
        self.stats.suppressed.record(reason);
    }

    /// Reset the book and statistics.
    pub fn reset(&mut self) {
        self.book.clear();
        self.stats = ReconStats::default();
    }

    fn in_window(&self, action: Action, side: Side, price: Price) -> bool {
        match self.config.emit_policy {
            EmitPolicy::All => true,
            EmitPolicy::WindowOnly => self.book.affects_window(action, side, price),
        }
    }

    fn apply(&mut self, record: &MboRecord<'_>) {
        match record.action {
            Action::Reset => {
                self.book.clear();
                self.stats.resets += 1;
            }
            Action::Add => {
                let outcome =
                    self.book
                        .add(record.order_id, record.price, record.size, record.side);
                if outcome == AddOutcome::Replaced {
                    self.stats.replaced_orders += 1;
                }
            }
            Action::Cancel if record.side.is_defined() => {
                match self.book.cancel(record.order_id, record.size) {
                    CancelOutcome::UnknownOrder => {
                        self.stats.unknown_cancels += 1;
                        log::debug!(
                            "Cancel for unknown order {} (seq {})",
                            record.order_id,
                            record.sequence
                        );
                    }
                    CancelOutcome::Complete { clamped: true, .. } => {
                        self.stats.clamped_cancels += 1;
                    }
                    _ => {}
                }
            }
            Action::Cancel | Action::Trade | Action::Fill => {}
        }
    }

    fn emit<'a>(
        &mut self,
        record: &MboRecord<'a>,
        side: Side,
        depth: usize,
        in_window: bool,
    ) -> Option<Snapshot<'a>> {
        self.stats.active_orders = self.book.order_count();
        self.stats.bid_levels = self.book.bid_levels();
        self.stats.ask_levels = self.book.ask_levels();

        if !in_window {
            self.suppress(SkipReason::OutsideWindow, &record.sequence);
            return None;
        }

        self.stats.rows_emitted += 1;
        Some(Snapshot::capture(
            record,
            side,
            depth,
            self.config.schema,
            &self.book,
        ))
    }

    fn suppress(&mut self, reason: SkipReason, detail: &dyn std::fmt::Display) {
        self.stats.suppressed.record(reason);
        if self.config.log_suppressed {
            log::debug!(
                "Suppressed record #{} ({}): {}",
                self.stats.records_processed,
                reason.name(),
                detail
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_price;

    fn line(action: char, side: char, price: &str, size: u64, order_id: u64) -> String {
        format!("r,e,160,2,1108,{action},{side},{price},{size},0,{order_id},130,0,1,ARL")
    }

    fn fields(row: &str) -> Vec<String> {
        row.split(',').map(str::to_string).collect()
    }

    fn px(s: &str) -> Price {
        parse_price(s).unwrap()
    }

    #[test]
    fn test_new_reconstructor() {
        let lob = Mbp10Reconstructor::new();
        assert!(lob.book().is_empty());
        assert_eq!(lob.stats().records_processed, 0);
        assert_eq!(lob.config().emit_policy, EmitPolicy::All);
    }

    #[test]
    fn test_add_same_price_scenario() {
        let mut lob = Mbp10Reconstructor::new();

        let l1 = line('A', 'B', "10.50", 100, 1);
        let row = fields(&lob.process_line(&l1).unwrap().to_csv(0));
        assert_eq!(&row[14..17], &["10.5", "100", "1"]);
        assert_eq!(&row[17..20], &["", "0", "0"]);

        let l2 = line('A', 'B', "10.50", 50, 2);
        let row = fields(&lob.process_line(&l2).unwrap().to_csv(1));
        assert_eq!(row[8], "0");
        assert_eq!(&row[14..17], &["10.5", "150", "2"]);

        let l3 = line('C', 'B', "10.50", 100, 1);
        let row = fields(&lob.process_line(&l3).unwrap().to_csv(2));
        assert_eq!(row[8], "0");
        assert_eq!(&row[14..17], &["10.5", "50", "1"]);
    }

    #[test]
    fn test_add_then_cancel_ask_empties_side() {
        let mut lob = Mbp10Reconstructor::new();
        let add = line('A', 'A', "9.00", 10, 3);
        let cancel = line('C', 'A', "9.00", 10, 3);
        assert!(lob.process_line(&add).is_some());
        let snap = lob.process_line(&cancel).unwrap();
        assert_eq!(snap.side, Side::Ask);
        assert_eq!(snap.levels.ask_depth(), 0);
        assert!(lob.book().asks().is_empty());
    }

    #[test]
    fn test_depth_is_pre_mutation() {
        let mut lob = Mbp10Reconstructor::new();
        for (id, p) in [(1, "12"), (2, "11"), (3, "10")] {
            lob.process_line(&line('A', 'B', p, 5, id));
        }
        // Cancel the middle level entirely: depth reported is its old rank.
        let cancel = line('C', 'B', "11", 5, 2);
        let snap = lob.process_line(&cancel).unwrap();
        assert_eq!(snap.depth, 1);
        assert_eq!(snap.levels.bid_depth(), 2);

        // Add below every level reports the append position.
        let add = line('A', 'B', "1", 5, 9);
        assert_eq!(lob.process_line(&add).unwrap().depth, 2);
    }

    #[test]
    fn test_trade_reports_book_without_mutation() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "10", 5, 1));
        let trade = line('T', 'A', "10", 2, 0);
        let snap = lob.process_line(&trade).unwrap();
        assert_eq!(snap.action, Action::Trade);
        assert_eq!(snap.side, Side::Ask);
        assert_eq!(snap.depth, 0);
        assert_eq!(snap.levels.bids[0].unwrap().size, 5);
    }

    #[test]
    fn test_fill_never_emits() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "10", 5, 1));
        assert!(lob.process_line(&line('F', 'B', "10", 5, 1)).is_none());
        assert_eq!(lob.book().order(1).unwrap().size, 5);
        assert_eq!(lob.stats().suppressed.fill, 1);
    }

    #[test]
    fn test_reset_clears_and_emits() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "10", 5, 1));
        lob.process_line(&line('A', 'A', "11", 5, 2));
        let rec = line('R', 'N', "", 0, 0);
        let snap = lob.process_line(&rec).unwrap();
        assert_eq!(snap.levels, Default::default());
        assert!(lob.book().is_empty());
        assert!(lob.process_line(&line('R', 'N', "", 0, 0)).is_some());
        assert!(lob.book().is_empty());
        assert_eq!(lob.stats().resets, 2);
    }

    #[test]
    fn test_side_none_add_emits_without_mutation() {
        let mut lob = Mbp10Reconstructor::new();
        let rec = line('A', 'N', "10", 5, 1);
        let snap = lob.process_line(&rec).unwrap();
        assert_eq!(snap.side, Side::None);
        assert!(lob.book().is_empty());
    }

    #[test]
    fn test_unknown_side_code_emits_without_mutation() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "10", 5, 1));

        let rec = line('T', 'X', "10", 2, 0);

        let snap = lob.process_line(&rec).unwrap();
        assert_eq!(snap.side, Side::Other('X'));
        assert_eq!(snap.depth, 0);

        let rec = line('C', 'X', "10", 5, 1);

        let snap = lob.process_line(&rec).unwrap();
        assert_eq!(snap.levels.bids[0].unwrap().size, 5);
        let rec = line('A', 'X', "11", 5, 2);
        let snap = lob.process_line(&rec).unwrap();
        assert_eq!(snap.levels.bid_depth(), 1);
        assert_eq!(lob.book().order_count(), 1);
        assert_eq!(lob.stats().suppressed.total(), 0);
    }

    #[test]
    fn test_unknown_cancel_emits_row() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "10", 5, 1));
        let rec = line('C', 'B', "10", 5, 99);
        let snap = lob.process_line(&rec).unwrap();
        assert_eq!(snap.levels.bids[0].unwrap().size, 5);
        assert_eq!(lob.stats().unknown_cancels, 1);
    }

    #[test]
    fn test_clamped_cancel_counted() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "10", 5, 1));
        lob.process_line(&line('C', 'B', "10", 50, 1));
        assert!(lob.book().is_empty());
        assert_eq!(lob.stats().clamped_cancels, 1);
    }

    #[test]
    fn test_malformed_records_suppressed() {
        let mut lob = Mbp10Reconstructor::with_config(Mbp10Config::new().with_logging(false));
        assert!(lob.process_line("a,b,c").is_none());
        assert!(lob
            .process_line("r,e,160,2,1108,M,B,10,5,0,1,130,0,1,ARL")
            .is_none());
        assert!(lob
            .process_line("r,e,160,2,1108,A,B,ten,5,0,1,130,0,1,ARL")
            .is_none());
        assert!(lob.book().is_empty());

        let s = &lob.stats().suppressed;
        assert_eq!(s.malformed, 1);
        assert_eq!(s.unknown_action, 1);
        assert_eq!(s.invalid_number, 1);
        assert_eq!(lob.stats().rows_emitted, 0);
    }

    #[test]
    fn test_process_merged_uses_cancel_for_book() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "100", 20, 42));
        lob.process_line(&line('A', 'B', "101", 1, 7));

        let trade_line = "r,te,160,2,1108,T,A,100,5,0,0,130,0,77,ARL";
        let cancel_line = line('C', 'B', "100", 5, 42);
        let trade = MboRecord::parse(trade_line).unwrap();
        let cancel = MboRecord::parse(&cancel_line).unwrap();

        let snap = lob.process_merged(&trade, &cancel).unwrap();
        assert_eq!(snap.action, Action::Trade);
        assert_eq!(snap.side, Side::Bid);
        assert_eq!(snap.depth, 1);
        assert_eq!(snap.ts_event, "te");
        assert_eq!(snap.sequence, "77");
        assert_eq!(lob.book().order(42).unwrap().size, 15);
        assert_eq!(lob.stats().merged_sequences, 1);
    }

    #[test]
    fn test_window_only_policy() {
        let config = Mbp10Config::new().with_emit_policy(EmitPolicy::WindowOnly);
        let mut lob = Mbp10Reconstructor::with_config(config);
        for i in 0..10u64 {
            let p = (100 - i).to_string();
            assert!(lob.process_line(&line('A', 'A', &p, 1, i + 1)).is_some());
        }
        // Asks 91..100 fill the window; 150 would sit at rank 10.
        assert!(lob.process_line(&line('A', 'A', "150", 1, 50)).is_none());
        assert_eq!(lob.book().asks().len(), 11);
        assert!(lob.process_line(&line('C', 'A', "150", 1, 50)).is_none());
        assert!(lob.process_line(&line('A', 'A', "90", 1, 51)).is_some());
        assert_eq!(lob.stats().suppressed.outside_window, 2);
        assert_eq!(lob.book().asks().best(), Some(px("90")));
    }

    #[test]
    fn test_config_json_defaults() {
        let config: Mbp10Config =
            serde_json::from_str(r#"{"emit_policy":"window_only"}"#).unwrap();
        assert_eq!(config.emit_policy, EmitPolicy::WindowOnly);
        assert_eq!(config.schema, SchemaIds::default());
        assert!(config.log_suppressed);
    }

    #[test]
    fn test_reset_method_clears_stats() {
        let mut lob = Mbp10Reconstructor::new();
        lob.process_line(&line('A', 'B', "10", 5, 1));
        lob.reset();
        assert!(lob.book().is_empty());
        assert_eq!(lob.stats(), &ReconStats::default());
    }
}
