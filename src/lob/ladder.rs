//! One side of the price-level ledger.
//!
//! A `Ladder` keeps levels in a `BTreeMap` keyed by exact price and walks it
//! best-to-worst: descending for bids, ascending for asks. Rank queries are
//! answered against that ordering and are what the depth locator uses.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::iter::Rev;
use std::ops::Bound::{Excluded, Unbounded};

use super::price_level::PriceLevel;
use crate::types::{Price, Side};

/// Price levels for one side of the book.
#[derive(Debug, Clone)]
pub struct Ladder {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl Ladder {
    /// Create an empty ladder. `Side::None` behaves like an ask ladder.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Side this ladder belongs to.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Add size and orders at `price`, creating the level if needed.
    pub fn upsert(&mut self, price: Price, size_delta: u64, count_delta: u64) {
        self.levels
            .entry(price)
            .or_default()
            .add(size_delta, count_delta);
    }

    /// Remove size and orders at `price`, dropping the level if it empties.
    ///
    /// Returns `false` if no level exists at `price`.
    pub fn reduce(&mut self, price: Price, size: u64, count: u64) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };
        level.reduce(size, count);
        self.remove_if_empty(price);
        true
    }

    /// Drop the level at `price` if it has no resting size.
    pub fn remove_if_empty(&mut self, price: Price) -> bool {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
            return true;
        }
        false
    }

    /// Level at `price`.
    #[inline]
    pub fn get(&self, price: &Price) -> Option<&PriceLevel> {
        self.levels.get(price)
    }

    /// Zero-based rank of `price` in best-to-worst order, if present.
    pub fn rank_of(&self, price: Price) -> Option<usize> {
        self.levels
            .contains_key(&price)
            .then(|| self.insertion_rank(price))
    }

    /// Number of levels strictly better than `price`.
    ///
    /// This is the index an existing level at `price` occupies, or the index
    /// a new level would be inserted at (the level count when `price` is worse
    /// than everything).
    pub fn insertion_rank(&self, price: Price) -> usize {
        if self.side.is_bid() {
            self.levels.range((Excluded(price), Unbounded)).count()
        } else {
            self.levels.range(..price).count()
        }
    }

    /// Levels in best-to-worst order.
    pub fn iter(&self) -> LevelIter<'_> {
        if self.side.is_bid() {
            LevelIter::Descending(self.levels.iter().rev())
        } else {
            LevelIter::Ascending(self.levels.iter())
        }
    }

    /// First `n` levels in best-to-worst order.
    pub fn top(&self, n: usize) -> std::iter::Take<LevelIter<'_>> {
        self.iter().take(n)
    }

    /// Best price on this side.
    pub fn best(&self) -> Option<Price> {
        self.iter().next().map(|(price, _)| *price)
    }

    /// Number of levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True if no levels rest on this side.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Remove every level.
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

/// Best-to-worst iterator over a [`Ladder`].
pub enum LevelIter<'a> {
    Ascending(btree_map::Iter<'a, Price, PriceLevel>),
    Descending(Rev<btree_map::Iter<'a, Price, PriceLevel>>),
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = (&'a Price, &'a PriceLevel);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            LevelIter::Ascending(iter) => iter.next(),
            LevelIter::Descending(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            LevelIter::Ascending(iter) => iter.size_hint(),
            LevelIter::Descending(iter) => iter.size_hint(),
        }
    }
}
