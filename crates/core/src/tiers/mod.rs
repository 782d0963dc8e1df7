//! Tier grouping.
//!
//! Normalized releases are bucketed by category and resolution; the named
//! tiers ([`TierName`]) and the phased resolution split are views over those
//! buckets.

mod grouper;
mod types;

pub use grouper::TierGroups;
pub use types::{SortPolicy, TierName, TraversalMode};
