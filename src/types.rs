//! Core data types for MBO events and book state.
//!
//! Prices are exact decimals parsed straight from the record text, so two
//! spellings of the same price (`10.50`, `10.5`) land on the same level and
//! no tolerance comparison is needed.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exact decimal price.
pub type Price = Decimal;

/// Number of price levels per side in an MBP-10 row.
pub const MBP_LEVELS: usize = 10;

/// Minimum number of comma-separated fields in an input record.
pub const MIN_FIELDS: usize = 15;

/// Records the collapser may peek past the cursor.
pub const LOOKAHEAD: usize = 4;

/// MBO action type (what happened to the order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Clear the whole book
    Reset = b'R',
    /// Add new order to book
    Add = b'A',
    /// Cancel (fully or partially) a resting order
    Cancel = b'C',
    /// Trade print, book unchanged
    Trade = b'T',
    /// Fill of a resting order, never reported
    Fill = b'F',
}

impl Action {
    /// Parse action from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'R' => Some(Action::Reset),
            b'A' => Some(Action::Add),
            b'C' => Some(Action::Cancel),
            b'T' => Some(Action::Trade),
            b'F' => Some(Action::Fill),
            _ => None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Single-character code used in output rows.
    pub fn as_char(self) -> char {
        self.to_byte() as char
    }
}

/// Order side (bid or ask)
///
/// Codes other than `B`, `A` and `N` are kept as [`Side::Other`]: they never
/// touch the book but are echoed in output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy order (bid)
    Bid,
    /// Sell order (ask)
    Ask,
    /// No side (resets, some trades)
    None,
    /// Unrecognised side code
    Other(char),
}

impl Side {
    /// Parse one of the known side codes from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Bid),
            b'A' => Some(Side::Ask),
            b'N' => Some(Side::None),
            _ => None,
        }
    }

    /// Side for any code character.
    pub fn from_char(code: char) -> Self {
        match code {
            'B' => Side::Bid,
            'A' => Side::Ask,
            'N' => Side::None,
            other => Side::Other(other),
        }
    }

    /// Single-character code used in output rows.
    pub fn as_char(self) -> char {
        match self {
            Side::Bid => 'B',
            Side::Ask => 'A',
            Side::None => 'N',
            Side::Other(code) => code,
        }
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }

    /// True for `Bid` and `Ask`.
    #[inline(always)]
    pub fn is_defined(self) -> bool {
        matches!(self, Side::Bid | Side::Ask)
    }
}

/// Order information stored in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub side: Side,
    pub price: Price,
    pub size: u64,
}

/// Why a record produced no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Too few fields or empty action/side
    Malformed,
    /// Action code outside `R|A|C|T|F`
    UnknownAction,
    /// Price, size or order id failed to parse
    InvalidNumber,
    /// Fill records are never reported
    Fill,
    /// Trade folded into a following Cancel
    CollapsedTrade,
    /// Event did not touch the top-10 window (window-only policy)
    OutsideWindow,
}

impl SkipReason {
    /// Stable name for logs and stats.
    pub fn name(&self) -> &'static str {
        match self {
            SkipReason::Malformed => "malformed",
            SkipReason::UnknownAction => "unknown_action",
            SkipReason::InvalidNumber => "invalid_number",
            SkipReason::Fill => "fill",
            SkipReason::CollapsedTrade => "collapsed_trade",
            SkipReason::OutsideWindow => "outside_window",
        }
    }
}

/// Parse price text into a normalized decimal.
///
/// Accepts plain (`10.50`, `-3`) and scientific (`1.05e1`) notation.
/// Digit separators (`1_0.5`) are rejected.
pub fn parse_price(text: &str) -> Option<Price> {
    let text = text.trim();
    if text.contains('_') {
        return None;
    }
    let parsed = match Decimal::from_str(text) {
        Ok(price) => price,
        Err(_) if text.contains(['e', 'E']) => Decimal::from_scientific(text).ok()?,
        Err(_) => return None,
    };
    Some(parsed.normalize())
}

/// Render a price in its shortest decimal form: no trailing fractional
/// zeros and no trailing decimal point.
pub fn format_price(price: Price) -> String {
    price.normalize().to_string()
}
