//! Limit Order Book (LOB) state and the MBO event processor.
//!
//! - [`PriceLevel`]: aggregate size and order count at one price
//! - [`Ladder`]: one side's levels in best-to-worst order
//! - [`Book`]: both ladders plus the resting-order registry
//! - [`Mbp10Reconstructor`]: applies events and produces snapshots

pub mod book;
pub mod ladder;
pub mod price_level;
pub mod reconstructor;

pub use book::{AddOutcome, Book, CancelOutcome};
pub use ladder::Ladder;
pub use price_level::PriceLevel;
pub use reconstructor::{
    EmitPolicy, Mbp10Config, Mbp10Reconstructor, ReconStats, SuppressionCounts,
};
