use serde::{Deserialize, Serialize};
use std::fmt;

use crate::release::{QualityCategory, Resolution};

/// Ordering applied inside each category×resolution bucket.
///
/// Ties always fall back to info hash ascending so the walk is total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Seeders descending, then size descending.
    #[default]
    SeedersThenSize,
    /// Size descending only.
    SizeOnly,
}

/// How the tier walk is split into phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// High-res pass, then season packs, then low-res pass.
    #[default]
    Phased,
    /// The four tiers in order, then season packs.
    Flat,
}

/// Named search tiers, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierName {
    Golden,
    Fallback,
    Compromise,
    LastResort,
}

impl TierName {
    pub const ALL: [TierName; 4] = [
        TierName::Golden,
        TierName::Fallback,
        TierName::Compromise,
        TierName::LastResort,
    ];

    pub fn categories(&self) -> &'static [QualityCategory] {
        match self {
            TierName::Golden | TierName::Fallback => &QualityCategory::HIGH_VALUE,
            TierName::Compromise => &[QualityCategory::WebRip],
            TierName::LastResort => &[QualityCategory::AudioFocused, QualityCategory::Other],
        }
    }

    pub fn resolutions(&self) -> &'static [Resolution] {
        match self {
            TierName::Golden => &Resolution::HIGH,
            TierName::Fallback => &[Resolution::P720],
            TierName::Compromise => &[Resolution::P2160, Resolution::P1080, Resolution::P720],
            TierName::LastResort => &[
                Resolution::P2160,
                Resolution::P1080,
                Resolution::P720,
                Resolution::P480,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TierName::Golden => "golden",
            TierName::Fallback => "fallback",
            TierName::Compromise => "compromise",
            TierName::LastResort => "last_resort",
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
