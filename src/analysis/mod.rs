//! Analysis modules.
//!
//! Ranking, trend derivation, and the cross-cycle snapshot tracker.

pub mod aggregator;
pub mod tracker;
pub mod trend;

pub use aggregator::*;
pub use tracker::SnapshotTracker;
pub use trend::derive_trend;
