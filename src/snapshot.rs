//! MBP-10 snapshot rows.
//!
//! A [`Snapshot`] pairs the descriptive fields of the event that produced it
//! with the top ten levels of each side, read from the book after the event
//! was applied. Encoding is a pure read; the row index is supplied by the
//! caller.
//!
//! Row layout (76 fields):
//!
//! ```text
//! index, ts_recv, ts_event, rtype, publisher_id, instrument_id,
//! action, side, depth, price, size, flags, ts_in_delta, sequence,
//! { bid_px, bid_sz, bid_ct, ask_px, ask_sz, ask_ct } x 10,
//! symbol, order_id
//! ```

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::lob::Book;
use crate::record::MboRecord;
use crate::types::{format_price, Action, Price, Side, MBP_LEVELS};

/// Number of fields in an encoded row.
pub const ROW_FIELDS: usize = 14 + MBP_LEVELS * 6 + 2;

/// Schema-identifying constants written into every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIds {
    pub rtype: u16,
    pub publisher_id: u16,
    pub instrument_id: u32,
}

impl Default for SchemaIds {
    fn default() -> Self {
        Self {
            rtype: 10,
            publisher_id: 2,
            instrument_id: 1108,
        }
    }
}

/// One aggregated level as rendered in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelView {
    pub price: Price,
    pub size: u128,
    pub count: u64,
}

/// Top levels of both sides, best first. Unpopulated slots are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthLevels {
    pub bids: [Option<LevelView>; MBP_LEVELS],
    pub asks: [Option<LevelView>; MBP_LEVELS],
}

impl DepthLevels {
    /// Read the top `MBP_LEVELS` of each side. Bids and asks are filled
    /// independently, slot by slot.
    pub fn from_book(book: &Book) -> Self {
        let mut levels = Self::default();
        for (slot, (price, level)) in levels.bids.iter_mut().zip(book.bids().top(MBP_LEVELS)) {
            *slot = Some(LevelView {
                price: *price,
                size: level.total_size(),
                count: level.order_count(),
            });
        }
        for (slot, (price, level)) in levels.asks.iter_mut().zip(book.asks().top(MBP_LEVELS)) {
            *slot = Some(LevelView {
                price: *price,
                size: level.total_size(),
                count: level.order_count(),
            });
        }
        levels
    }

    /// Number of populated bid slots.
    pub fn bid_depth(&self) -> usize {
        self.bids.iter().take_while(|l| l.is_some()).count()
    }

    /// Number of populated ask slots.
    pub fn ask_depth(&self) -> usize {
        self.asks.iter().take_while(|l| l.is_some()).count()
    }
}

/// Book state immediately after one event, with that event's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<'a> {
    pub ts_recv: &'a str,
    pub ts_event: &'a str,
    pub schema: SchemaIds,
    pub action: Action,
    pub side: Side,
    /// Rank of the event's price before it was applied
    pub depth: usize,
    /// Event price, `None` when the record carried no price
    pub price: Option<Price>,
    pub size: &'a str,
    pub flags: &'a str,
    pub ts_in_delta: &'a str,
    pub sequence: &'a str,
    pub symbol: &'a str,
    pub order_id: &'a str,
    pub levels: DepthLevels,
}

impl<'a> Snapshot<'a> {
    /// Build a snapshot from a record's descriptive fields and the book.
    pub fn capture(
        record: &MboRecord<'a>,
        side: Side,
        depth: usize,
        schema: SchemaIds,
        book: &Book,
    ) -> Self {
        Self {
            ts_recv: record.ts_recv,
            ts_event: record.ts_event,
            schema,
            action: record.action,
            side,
            depth,
            price: (!record.price_text.is_empty()).then_some(record.price),
            size: record.size_text,
            flags: record.flags,
            ts_in_delta: record.ts_in_delta,
            sequence: record.sequence,
            symbol: record.symbol,
            order_id: record.order_id_text,
            levels: DepthLevels::from_book(book),
        }
    }

    /// Write the row with the given index, without a line terminator.
    ///
    /// Both timestamp columns carry the event timestamp.
    pub fn write_csv<W: Write>(&self, index: u64, out: &mut W) -> fmt::Result {
        write!(
            out,
            "{index},{ts},{ts},{},{},{},{},{},{},",
            self.schema.rtype,
            self.schema.publisher_id,
            self.schema.instrument_id,
            self.action.as_char(),
            self.side.as_char(),
            self.depth,
            ts = self.ts_event,
        )?;
        if let Some(price) = self.price {
            out.write_str(&format_price(price))?;
        }
        write!(
            out,
            ",{},{},{},{}",
            self.size, self.flags, self.ts_in_delta, self.sequence
        )?;

        for (bid, ask) in self.levels.bids.iter().zip(self.levels.asks.iter()) {
            write_level(out, bid)?;
            write_level(out, ask)?;
        }

        write!(out, ",{},{}", self.symbol, self.order_id)
    }

    /// Encode the row with the given index.
    pub fn to_csv(&self, index: u64) -> String {
        let mut row = String::with_capacity(256);
        let _ = self.write_csv(index, &mut row);
        row
    }
}

fn write_level<W: Write>(out: &mut W, level: &Option<LevelView>) -> fmt::Result {
    match level {
        Some(level) => write!(
            out,
            ",{},{},{}",
            format_price(level.price),
            level.size,
            level.count
        ),
        None => out.write_str(",,0,0"),
    }
}

/// Column header for encoded rows. The index column has an empty name.
pub fn csv_header() -> String {
    let mut header = String::from(
        ",ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,flags,ts_in_delta,sequence",
    );
    for i in 0..MBP_LEVELS {
        let _ = write!(
            header,
            ",bid_px_{i:02},bid_sz_{i:02},bid_ct_{i:02},ask_px_{i:02},ask_sz_{i:02},ask_ct_{i:02}"
        );
    }
    header.push_str(",symbol,order_id");
    header
}
