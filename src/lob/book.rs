//! Book state: bid and ask ledgers plus the resting-order registry.
//!
//! Every registry mutation is paired with the matching ledger update in the
//! same call, so the aggregate invariant holds between any two calls:
//! each level's `total_size`/`order_count` equal the sum/number of registry
//! orders at that price and side.

use ahash::AHashMap;

use super::ladder::Ladder;
use crate::error::{MbpError, Result};
use crate::types::{Action, Order, Price, Side, MBP_LEVELS};

/// Result of [`Book::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New order now rests on the book
    Rested,
    /// An order with the same id was replaced
    Replaced,
    /// Nothing rests (side-less or zero size)
    Ignored,
}

/// Result of [`Book::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// No resting order with this id; book unchanged
    UnknownOrder,
    /// Order reduced but still resting
    Partial { canceled: u64 },
    /// Order removed. `clamped` is set when more was requested than rested.
    Complete { canceled: u64, clamped: bool },
}

/// Two-sided aggregated book with its order registry.
#[derive(Debug, Clone)]
pub struct Book {
    bids: Ladder,
    asks: Ladder,
    /// order_id -> resting order
    orders: AHashMap<u64, Order>,
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl Book {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bids: Ladder::new(Side::Bid),
            asks: Ladder::new(Side::Ask),
            orders: AHashMap::new(),
        }
    }

    /// Pre-allocate registry capacity.
    pub fn reserve_orders(&mut self, n: usize) {
        self.orders.reserve(n);
    }

    /// Bid ledger (best first).
    #[inline]
    pub fn bids(&self) -> &Ladder {
        &self.bids
    }

    /// Ask ledger (best first).
    #[inline]
    pub fn asks(&self) -> &Ladder {
        &self.asks
    }

    /// Ledger for `side`, or `None` for a side-less code.
    #[inline]
    pub fn ladder(&self, side: Side) -> Option<&Ladder> {
        match side {
            Side::Bid => Some(&self.bids),
            Side::Ask => Some(&self.asks),
            Side::None | Side::Other(_) => None,
        }
    }

    #[inline]
    fn ladder_mut(&mut self, side: Side) -> Option<&mut Ladder> {
        match side {
            Side::Bid => Some(&mut self.bids),
            Side::Ask => Some(&mut self.asks),
            Side::None | Side::Other(_) => None,
        }
    }

    /// Resting order by id.
    #[inline]
    pub fn order(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Number of resting orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of bid levels.
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Number of ask levels.
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// True if nothing rests on either side.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.bids.is_empty() && self.asks.is_empty()
    }

    /// Register a resting order and aggregate it into its level.
    ///
    /// A reused `order_id` replaces the old order; the old order's size and
    /// count are taken out of its level first.
    pub fn add(&mut self, order_id: u64, price: Price, size: u64, side: Side) -> AddOutcome {
        if !side.is_defined() || size == 0 {
            return AddOutcome::Ignored;
        }

        let replaced = match self.orders.remove(&order_id) {
            Some(old) => {
                if let Some(ladder) = self.ladder_mut(old.side) {
                    ladder.reduce(old.price, old.size, 1);
                }
                true
            }
            None => false,
        };

        if let Some(ladder) = self.ladder_mut(side) {
            ladder.upsert(price, size, 1);
        }
        self.orders.insert(order_id, Order { side, price, size });

        #[cfg(debug_assertions)]
        self.verify_invariants();

        if replaced {
            AddOutcome::Replaced
        } else {
            AddOutcome::Rested
        }
    }

    /// Cancel up to `requested` units of a resting order.
    ///
    /// The cancelled amount is clamped to the resting size. A request that
    /// covers the whole resting size removes the order and decrements the
    /// level's order count.
    pub fn cancel(&mut self, order_id: u64, requested: u64) -> CancelOutcome {
        let Some(order) = self.orders.get_mut(&order_id) else {
            return CancelOutcome::UnknownOrder;
        };

        let resting = order.size;
        let canceled = requested.min(resting);
        let complete = requested >= resting;
        let (side, price) = (order.side, order.price);

        if complete {
            self.orders.remove(&order_id);
        } else {
            order.size -= canceled;
        }

        if let Some(ladder) = self.ladder_mut(side) {
            ladder.reduce(price, canceled, u64::from(complete));
        }

        #[cfg(debug_assertions)]
        self.verify_invariants();

        if complete {
            CancelOutcome::Complete {
                canceled,
                clamped: requested > resting,
            }
        } else {
            CancelOutcome::Partial { canceled }
        }
    }

    /// Remove every order and level.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }

    /// Rank the event's price occupies before the event is applied.
    ///
    /// * Cancel: index of the level at `price`, 0 if absent.
    /// * Add: index of the first level not better than `price` (the level
    ///   count when `price` is worse than all of them, even past the window).
    /// * Anything else, or no side: 0.
    pub fn depth_before(&self, action: Action, side: Side, price: Price) -> usize {
        let Some(ladder) = self.ladder(side) else {
            return 0;
        };
        match action {
            Action::Cancel => ladder.rank_of(price).unwrap_or(0),
            Action::Add => ladder.insertion_rank(price),
            Action::Reset | Action::Trade | Action::Fill => 0,
        }
    }

    /// Whether an event touches the top-`MBP_LEVELS` window, judged before it
    /// is applied. Resets and trades always do.
    pub fn affects_window(&self, action: Action, side: Side, price: Price) -> bool {
        match action {
            Action::Reset | Action::Trade => return true,
            Action::Fill => return false,
            Action::Add | Action::Cancel => {}
        }
        let Some(ladder) = self.ladder(side) else {
            return false;
        };
        match action {
            Action::Add => ladder.insertion_rank(price) < MBP_LEVELS,
            _ => ladder.rank_of(price).is_some_and(|rank| rank < MBP_LEVELS),
        }
    }

    /// Check the aggregate invariant between registry and ledgers.
    pub fn check_invariants(&self) -> Result<()> {
        let mut expected: AHashMap<(Side, Price), (u128, u64)> = AHashMap::new();
        for (id, order) in &self.orders {
            if order.size == 0 {
                return Err(MbpError::InconsistentState(format!(
                    "order {id} rests with zero size"
                )));
            }
            let entry = expected.entry((order.side, order.price)).or_default();
            entry.0 += u128::from(order.size);
            entry.1 += 1;
        }

        let mut levels = 0;
        for ladder in [&self.bids, &self.asks] {
            for (price, level) in ladder.iter() {
                levels += 1;
                let (size, count) = expected
                    .get(&(ladder.side(), *price))
                    .copied()
                    .unwrap_or_default();
                if level.is_empty() || level.total_size() != size || level.order_count() != count {
                    return Err(MbpError::InconsistentState(format!(
                        "{:?} level {price}: size={} count={}, orders sum={size} n={count}",
                        ladder.side(),
                        level.total_size(),
                        level.order_count(),
                    )));
                }
            }
        }

        if levels != expected.len() {
            return Err(MbpError::InconsistentState(format!(
                "{} levels for {} order groups",
                levels,
                expected.len()
            )));
        }
        Ok(())
    }

    /// Assert the aggregate invariant in debug builds.
    #[cfg(debug_assertions)]
    #[inline]
    pub fn verify_invariants(&self) {
        if let Err(e) = self.check_invariants() {
            debug_assert!(false, "Book invariant violated: {e}");
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub fn verify_invariants(&self) {}
}
