//! Parsing of delimited MBO records.
//!
//! Field layout (extra trailing fields are ignored):
//!
//! | idx | field | idx | field |
//! |-----|-------|-----|-------|
//! | 0 | ts_recv | 8 | size |
//! | 1 | ts_event | 9 | channel_id (unused) |
//! | 2-4 | rtype, publisher_id, instrument_id (unused) | 10 | order_id |
//! | 5 | action | 11 | flags |
//! | 6 | side | 12 | ts_in_delta |
//! | 7 | price | 13 | sequence |
//! | | | 14 | symbol |
//!
//! A parsed [`MboRecord`] borrows its descriptive fields from the line so the
//! snapshot encoder can echo them without copying.

use crate::error::{MbpError, Result};
use crate::types::{parse_price, Action, Price, Side, MIN_FIELDS};

const TS_RECV: usize = 0;
const TS_EVENT: usize = 1;
const ACTION: usize = 5;
const SIDE: usize = 6;
const PRICE: usize = 7;
const SIZE: usize = 8;
const ORDER_ID: usize = 10;
const FLAGS: usize = 11;
const TS_IN_DELTA: usize = 12;
const SEQUENCE: usize = 13;
const SYMBOL: usize = 14;

/// One parsed MBO record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MboRecord<'a> {
    pub action: Action,
    pub side: Side,
    /// Parsed price; zero when the field is empty
    pub price: Price,
    /// Parsed size; zero when the field is empty
    pub size: u64,
    /// Parsed order id; zero when the field is empty
    pub order_id: u64,

    pub ts_recv: &'a str,
    pub ts_event: &'a str,
    /// Trimmed price text, empty if absent
    pub price_text: &'a str,
    pub size_text: &'a str,
    pub order_id_text: &'a str,
    pub flags: &'a str,
    pub ts_in_delta: &'a str,
    pub sequence: &'a str,
    pub symbol: &'a str,
}

impl<'a> MboRecord<'a> {
    /// Parse a comma-separated record.
    pub fn parse(line: &'a str) -> Result<Self> {
        let mut fields: [&'a str; MIN_FIELDS] = [""; MIN_FIELDS];
        let mut found = 0;
        for (slot, field) in fields.iter_mut().zip(line.split(',')) {
            *slot = field;
            found += 1;
        }
        if found < MIN_FIELDS {
            return Err(MbpError::MalformedRecord {
                expected: MIN_FIELDS,
                found,
            });
        }

        let action_byte = leading_byte(fields[ACTION]);
        let action = action_byte
            .and_then(Action::from_byte)
            .ok_or(MbpError::InvalidAction(action_byte.map(char::from)))?;

        let side = fields[SIDE]
            .chars()
            .next()
            .map(Side::from_char)
            .ok_or(MbpError::MissingSide)?;

        let price_text = fields[PRICE].trim();
        let price = if price_text.is_empty() {
            Price::ZERO
        } else {
            parse_price(price_text).ok_or_else(|| MbpError::InvalidNumber {
                field: "price",
                value: price_text.to_string(),
            })?
        };

        let size_text = fields[SIZE].trim();
        let size = parse_unsigned("size", size_text)?;
        let order_id_text = fields[ORDER_ID].trim();
        let order_id = parse_unsigned("order_id", order_id_text)?;

        Ok(Self {
            action,
            side,
            price,
            size,
            order_id,
            ts_recv: fields[TS_RECV].trim(),
            ts_event: fields[TS_EVENT].trim(),
            price_text,
            size_text,
            order_id_text,
            flags: fields[FLAGS].trim(),
            ts_in_delta: fields[TS_IN_DELTA].trim(),
            sequence: fields[SEQUENCE].trim(),
            symbol: fields[SYMBOL].trim(),
        })
    }
}

/// Action byte of a raw line without a full parse.
///
/// Used by the collapser's lookahead, which only needs to classify records.
/// Returns `None` for lines with fewer than six fields or an empty action.
pub fn peek_action(line: &str) -> Option<u8> {
    line.split(',').nth(ACTION).and_then(leading_byte)
}

#[inline]
fn leading_byte(field: &str) -> Option<u8> {
    field.as_bytes().first().copied()
}

fn parse_unsigned(field: &'static str, text: &str) -> Result<u64> {
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<u64>().map_err(|_| MbpError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}
