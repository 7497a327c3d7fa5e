//! Aggregate price level.
//!
//! The ledger never stores per-order detail, only the running totals for
//! one price on one side.
//!
//! # Invariant
//!
//! `total_size` equals the sum of resting sizes of registry orders at this
//! price/side, and `order_count` equals their number. The book keeps both in
//! step with the registry and drops the level once `total_size` is zero.
//! `total_size` is widened to `u128` so that any number of `u64` orders can
//! share a level without overflow.

/// A price level with aggregate size and order count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceLevel {
    total_size: u128,
    order_count: u64,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add resting size and orders.
    #[inline]
    pub fn add(&mut self, size: u64, count: u64) {
        self.total_size += u128::from(size);
        self.order_count = self.order_count.saturating_add(count);
    }

    /// Remove resting size and orders (saturating at zero).
    #[inline]
    pub fn reduce(&mut self, size: u64, count: u64) {
        self.total_size = self.total_size.saturating_sub(u128::from(size));
        self.order_count = self.order_count.saturating_sub(count);
    }

    /// Total resting size.
    #[inline]
    pub fn total_size(&self) -> u128 {
        self.total_size
    }

    /// Number of resting orders.
    #[inline]
    pub fn order_count(&self) -> u64 {
        self.order_count
    }

    /// A level with no resting size must not persist.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_price_level_is_empty() {
        let level = PriceLevel::new();
        assert!(level.is_empty());
        assert_eq!(level.total_size(), 0);
        assert_eq!(level.order_count(), 0);
    }

    #[test]
    fn test_add_and_reduce() {
        let mut level = PriceLevel::new();
        level.add(100, 1);
        level.add(50, 1);
        assert_eq!(level.total_size(), 150);
        assert_eq!(level.order_count(), 2);

        level.reduce(100, 1);
        assert_eq!(level.total_size(), 50);
        assert_eq!(level.order_count(), 1);
        assert!(!level.is_empty());
    }

    #[test]
    fn test_partial_reduce_keeps_count() {
        let mut level = PriceLevel::new();
        level.add(100, 1);
        level.reduce(30, 0);
        assert_eq!(level.total_size(), 70);
        assert_eq!(level.order_count(), 1);
    }

    #[test]
    fn test_reduce_saturates() {
        let mut level = PriceLevel::new();
        level.add(10, 1);
        level.reduce(25, 2);
        assert_eq!(level.total_size(), 0);
        assert_eq!(level.order_count(), 0);
        assert!(level.is_empty());
    }

    #[test]
    fn test_total_exceeds_u64() {
        let mut level = PriceLevel::new();
        level.add(u64::MAX, 1);
        level.add(1, 1);
        assert_eq!(level.total_size(), u128::from(u64::MAX) + 1);
        assert_eq!(level.order_count(), 2);

        level.reduce(u64::MAX, 1);
        assert_eq!(level.total_size(), 1);
        assert_eq!(level.order_count(), 1);
    }
}
