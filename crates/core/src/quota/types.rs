//! Quota limits and pre-existing inventory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::release::{Codec, QualityCategory, Resolution};

/// Maximum accepted results per category, applied to each resolution bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    #[serde(default = "default_remux")]
    pub remux: u32,
    #[serde(default = "default_bluray")]
    pub bluray: u32,
    #[serde(default = "default_web_dl")]
    pub web_dl: u32,
    #[serde(default = "default_web_rip")]
    pub web_rip: u32,
    #[serde(default = "default_audio_focused")]
    pub audio_focused: u32,
    #[serde(default = "default_other")]
    pub other: u32,
}

fn default_remux() -> u32 {
    1
}

fn default_bluray() -> u32 {
    2
}

fn default_web_dl() -> u32 {
    2
}

fn default_web_rip() -> u32 {
    1
}

fn default_audio_focused() -> u32 {
    1
}

fn default_other() -> u32 {
    3
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            remux: default_remux(),
            bluray: default_bluray(),
            web_dl: default_web_dl(),
            web_rip: default_web_rip(),
            audio_focused: default_audio_focused(),
            other: default_other(),
        }
    }
}

impl QuotaLimits {
    pub fn get(&self, category: QualityCategory) -> u32 {
        match category {
            QualityCategory::Remux => self.remux,
            QualityCategory::BluRay => self.bluray,
            QualityCategory::WebDl => self.web_dl,
            QualityCategory::WebRip => self.web_rip,
            QualityCategory::AudioFocused => self.audio_focused,
            QualityCategory::Other => self.other,
        }
    }

    pub fn with_limit(mut self, category: QualityCategory, limit: u32) -> Self {
        let slot = match category {
            QualityCategory::Remux => &mut self.remux,
            QualityCategory::BluRay => &mut self.bluray,
            QualityCategory::WebDl => &mut self.web_dl,
            QualityCategory::WebRip => &mut self.web_rip,
            QualityCategory::AudioFocused => &mut self.audio_focused,
            QualityCategory::Other => &mut self.other,
        };
        *slot = limit;
        self
    }
}

/// Optional caps on total accepted results per resolution, across categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionCaps {
    #[serde(rename = "2160p", default, skip_serializing_if = "Option::is_none")]
    pub p2160: Option<u32>,
    #[serde(rename = "1080p", default, skip_serializing_if = "Option::is_none")]
    pub p1080: Option<u32>,
    #[serde(rename = "720p", default, skip_serializing_if = "Option::is_none")]
    pub p720: Option<u32>,
    #[serde(rename = "480p", default, skip_serializing_if = "Option::is_none")]
    pub p480: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<u32>,
}

impl ResolutionCaps {
    pub fn get(&self, resolution: Resolution) -> Option<u32> {
        match resolution {
            Resolution::P2160 => self.p2160,
            Resolution::P1080 => self.p1080,
            Resolution::P720 => self.p720,
            Resolution::P480 => self.p480,
            Resolution::Other => self.other,
        }
    }
}

/// Per-resolution caps on how many accepted results may share a codec family.
/// `None` leaves the family uncapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecCaps {
    #[serde(default = "default_codec_cap")]
    pub h265: Option<u32>,
    #[serde(default = "default_codec_cap")]
    pub h264: Option<u32>,
    #[serde(default)]
    pub unknown: Option<u32>,
}

fn default_codec_cap() -> Option<u32> {
    Some(3)
}

impl Default for CodecCaps {
    fn default() -> Self {
        Self {
            h265: default_codec_cap(),
            h264: default_codec_cap(),
            unknown: None,
        }
    }
}

impl CodecCaps {
    /// No codec diversification at all.
    pub fn uncapped() -> Self {
        Self {
            h265: None,
            h264: None,
            unknown: None,
        }
    }

    pub fn get(&self, codec: Codec) -> Option<u32> {
        match codec {
            Codec::H265 => self.h265,
            Codec::H264 => self.h264,
            Codec::Unknown => self.unknown,
        }
    }
}

/// Slots already filled by the caller's existing inventory.
///
/// A category either carries a per-resolution breakdown, or only a total.
/// A bare total counts against every resolution bucket of that category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfiedQuotas {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_category: BTreeMap<QualityCategory, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_resolution: BTreeMap<QualityCategory, BTreeMap<Resolution, u32>>,
}

impl SatisfiedQuotas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: QualityCategory, count: u32) -> Self {
        self.by_category.insert(category, count);
        self
    }

    pub fn with_resolution(
        mut self,
        category: QualityCategory,
        resolution: Resolution,
        count: u32,
    ) -> Self {
        *self
            .by_resolution
            .entry(category)
            .or_default()
            .entry(resolution)
            .or_insert(0) += count;
        self
    }

    /// Slots filled for one category×resolution bucket.
    pub fn get(&self, category: QualityCategory, resolution: Resolution) -> u32 {
        match self.by_resolution.get(&category) {
            Some(per_res) => per_res.get(&resolution).copied().unwrap_or(0),
            None => self.by_category.get(&category).copied().unwrap_or(0),
        }
    }

    /// Total slots filled for a category; summed from the breakdown if no
    /// total was given.
    pub fn category_total(&self, category: QualityCategory) -> u32 {
        self.by_category.get(&category).copied().unwrap_or_else(|| {
            self.by_resolution
                .get(&category)
                .map(|per_res| per_res.values().sum())
                .unwrap_or(0)
        })
    }

    /// Slots filled at a resolution across all categories (breakdowns only).
    pub fn resolution_total(&self, resolution: Resolution) -> u32 {
        self.by_resolution
            .values()
            .filter_map(|per_res| per_res.get(&resolution))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty() && self.by_resolution.is_empty()
    }
}

/// Why the ledger refused a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    CodecCap {
        resolution: Resolution,
        codec: Codec,
    },
    QuotaFull {
        category: QualityCategory,
        resolution: Resolution,
    },
    ResolutionCap {
        resolution: Resolution,
    },
}

/// One counter entry in a [`LedgerSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub category: QualityCategory,
    pub resolution: Resolution,
    pub count: u32,
}

/// One codec counter entry in a [`LedgerSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecCount {
    pub resolution: Resolution,
    pub codec: Codec,
    pub count: u32,
}

/// Serializable view of the ledger counters at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub accepted: Vec<BucketCount>,
    pub accepted_by_resolution: BTreeMap<Resolution, u32>,
    pub codec_counts: Vec<CodecCount>,
    pub bypass: bool,
}

impl LedgerSnapshot {
    /// Accepted count for one bucket (0 if absent).
    pub fn accepted(&self, category: QualityCategory, resolution: Resolution) -> u32 {
        self.accepted
            .iter()
            .find(|b| b.category == category && b.resolution == resolution)
            .map(|b| b.count)
            .unwrap_or(0)
    }

    /// Accepted count for a whole category.
    pub fn category_total(&self, category: QualityCategory) -> u32 {
        self.accepted
            .iter()
            .filter(|b| b.category == category)
            .map(|b| b.count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = QuotaLimits::default();
        assert_eq!(limits.get(QualityCategory::Remux), 1);
        assert!(limits.get(QualityCategory::Other) > limits.get(QualityCategory::Remux));
    }

    #[test]
    fn test_with_limit() {
        let limits = QuotaLimits::default().with_limit(QualityCategory::Remux, 4);
        assert_eq!(limits.get(QualityCategory::Remux), 4);
        assert_eq!(limits.get(QualityCategory::BluRay), 2);
    }

    #[test]
    fn test_limits_deserialize_partial() {
        let limits: QuotaLimits = toml::from_str("remux = 3\nweb_dl = 0\n").unwrap();
        assert_eq!(limits.get(QualityCategory::Remux), 3);
        assert_eq!(limits.get(QualityCategory::WebDl), 0);
        assert_eq!(limits.get(QualityCategory::Other), 3);
    }

    #[test]
    fn test_resolution_caps_deserialize() {
        let caps: ResolutionCaps = toml::from_str("\"2160p\" = 2\n").unwrap();
        assert_eq!(caps.get(Resolution::P2160), Some(2));
        assert_eq!(caps.get(Resolution::P1080), None);
    }

    #[test]
    fn test_codec_caps_default() {
        let caps = CodecCaps::default();
        assert_eq!(caps.get(Codec::H265), Some(3));
        assert_eq!(caps.get(Codec::Unknown), None);
        assert_eq!(CodecCaps::uncapped().get(Codec::H264), None);
    }

    #[test]
    fn test_satisfied_category_total_applies_to_every_resolution() {
        let satisfied = SatisfiedQuotas::new().with_category(QualityCategory::Remux, 1);
        assert_eq!(satisfied.get(QualityCategory::Remux, Resolution::P2160), 1);
        assert_eq!(satisfied.get(QualityCategory::Remux, Resolution::P720), 1);
        assert_eq!(satisfied.get(QualityCategory::BluRay, Resolution::P2160), 0);
        assert_eq!(satisfied.category_total(QualityCategory::Remux), 1);
    }

    #[test]
    fn test_satisfied_breakdown_is_summed() {
        let satisfied = SatisfiedQuotas::new()
            .with_resolution(QualityCategory::BluRay, Resolution::P1080, 1)
            .with_resolution(QualityCategory::BluRay, Resolution::P2160, 2)
            .with_resolution(QualityCategory::WebDl, Resolution::P1080, 1);

        assert_eq!(satisfied.get(QualityCategory::BluRay, Resolution::P1080), 1);
        assert_eq!(satisfied.get(QualityCategory::BluRay, Resolution::P720), 0);
        assert_eq!(satisfied.category_total(QualityCategory::BluRay), 3);
        assert_eq!(satisfied.resolution_total(Resolution::P1080), 2);
    }

    #[test]
    fn test_satisfied_deserialize() {
        let json = r#"{"by_category": {"remux": 1}, "by_resolution": {"bluray": {"1080p": 2}}}"#;
        let satisfied: SatisfiedQuotas = serde_json::from_str(json).unwrap();
        assert_eq!(satisfied.get(QualityCategory::Remux, Resolution::P1080), 1);
        assert_eq!(satisfied.get(QualityCategory::BluRay, Resolution::P1080), 2);
        assert!(!satisfied.is_empty());
    }
}
