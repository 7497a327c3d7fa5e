//! Trade → Fill → Cancel sequence collapsing.
//!
//! An aggressive execution against a resting order shows up in the feed as a
//! Trade, then a Fill, then a Cancel that removes the executed quantity from
//! the book. Only one row should be emitted for it. The collapser decides,
//! for the record at the cursor, whether it is processed, dropped, or merged
//! with a previously held Trade.
//!
//! ```text
//! cursor   T   F   ?   ?   ?
//! offset   0   1   2   3   4
//!                  └ first Cancel here, before any Add/Trade
//! ```

use crate::record::{peek_action, MboRecord};
use crate::source::RecordSource;
use crate::types::{Action, SkipReason, LOOKAHEAD};

/// What to do with the record at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Hand the record to the event processor.
    Process,
    /// Drop the record.
    Suppress(SkipReason),
    /// The record is the Cancel of a collapsed sequence; `trade` is the raw
    /// Trade line that opened it.
    Merge { trade: String },
}

#[derive(Debug, Clone)]
struct PendingTrade {
    line: String,
    /// Cursor moves left until the matching Cancel
    remaining: usize,
}

/// Stateful Trade/Fill/Cancel detector.
///
/// `decide` must be called exactly once per cursor position, in order.
#[derive(Debug, Clone, Default)]
pub struct SequenceCollapser {
    pending: Option<PendingTrade>,
}

impl SequenceCollapser {
    /// Create a collapser with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a Trade is being held for a later Cancel.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any held Trade.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Classify the record at the cursor of `source`.
    pub fn decide<S: RecordSource + ?Sized>(&mut self, source: &S) -> Decision {
        let Some(current) = source.peek(0) else {
            return Decision::Process;
        };

        if let Some(pending) = self.pending.as_mut() {
            pending.remaining = pending.remaining.saturating_sub(1);
            if pending.remaining == 0 {
                if let Some(held) = self.pending.take() {
                    return Decision::Merge { trade: held.line };
                }
            }
        }

        match action_of(current) {
            Some(Action::Fill) => Decision::Suppress(SkipReason::Fill),
            Some(Action::Trade) => match find_cancel(source) {
                Some(offset) if MboRecord::parse(current).is_ok() => {
                    log::trace!("Holding trade for cancel at +{offset}");
                    self.pending = Some(PendingTrade {
                        line: current.to_string(),
                        remaining: offset,
                    });
                    Decision::Suppress(SkipReason::CollapsedTrade)
                }
                _ => Decision::Process,
            },
            _ => Decision::Process,
        }
    }
}

#[inline]
fn action_of(line: &str) -> Option<Action> {
    peek_action(line).and_then(Action::from_byte)
}

/// Offset of the Cancel closing a Trade at the cursor, if the next record is
/// a Fill and a Cancel follows before any Add or Trade. Only action codes are
/// inspected; a Cancel that later fails to parse is suppressed on its own.
fn find_cancel<S: RecordSource + ?Sized>(source: &S) -> Option<usize> {
    if action_of(source.peek(1)?) != Some(Action::Fill) {
        return None;
    }
    for offset in 2..=LOOKAHEAD {
        let line = source.peek(offset)?;
        match action_of(line) {
            Some(Action::Cancel) => return Some(offset),
            Some(Action::Add) | Some(Action::Trade) => return None,
            _ => {}
        }
    }
    None
}
