//! Types for candidate and normalized releases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Quality class of a release, derived from its title.
///
/// Declaration order is the grouping order used by the tier walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCategory {
    Remux,
    BluRay,
    WebDl,
    WebRip,
    AudioFocused,
    Other,
}

impl QualityCategory {
    /// All categories, in grouping order.
    pub const ALL: [QualityCategory; 6] = [
        QualityCategory::Remux,
        QualityCategory::BluRay,
        QualityCategory::WebDl,
        QualityCategory::WebRip,
        QualityCategory::AudioFocused,
        QualityCategory::Other,
    ];

    /// Categories whose high-resolution quotas gate the run phases.
    pub const HIGH_VALUE: [QualityCategory; 3] = [
        QualityCategory::Remux,
        QualityCategory::BluRay,
        QualityCategory::WebDl,
    ];

    /// Ranking weight used when ordering season-pack candidates.
    pub fn quality_score(&self) -> u8 {
        match self {
            QualityCategory::Remux => 5,
            QualityCategory::BluRay => 4,
            QualityCategory::WebDl => 3,
            QualityCategory::WebRip => 2,
            QualityCategory::Other => 1,
            QualityCategory::AudioFocused => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityCategory::Remux => "remux",
            QualityCategory::BluRay => "bluray",
            QualityCategory::WebDl => "web_dl",
            QualityCategory::WebRip => "web_rip",
            QualityCategory::AudioFocused => "audio_focused",
            QualityCategory::Other => "other",
        }
    }
}

impl fmt::Display for QualityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical resolution bucket of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "other")]
    Other,
}

impl Resolution {
    pub const ALL: [Resolution; 5] = [
        Resolution::P2160,
        Resolution::P1080,
        Resolution::P720,
        Resolution::P480,
        Resolution::Other,
    ];

    /// Resolutions walked in the high-resolution phase.
    pub const HIGH: [Resolution; 2] = [Resolution::P2160, Resolution::P1080];

    /// Resolutions walked in the low-resolution phase.
    pub const LOW: [Resolution; 2] = [Resolution::P720, Resolution::P480];

    /// Ranking weight used when ordering season-pack candidates.
    pub fn resolution_score(&self) -> u8 {
        match self {
            Resolution::P2160 => 4,
            Resolution::P1080 => 3,
            Resolution::P720 => 2,
            Resolution::P480 => 1,
            Resolution::Other => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::P2160 => "2160p",
            Resolution::P1080 => "1080p",
            Resolution::P720 => "720p",
            Resolution::P480 => "480p",
            Resolution::Other => "other",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Video codec family, used for per-resolution diversification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    H265,
    H264,
    Unknown,
}

impl Codec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::H265 => "h265",
            Codec::H264 => "h264",
            Codec::Unknown => "unknown",
        }
    }
}

/// A raw candidate release as handed over by a scraper.
///
/// Scrapers disagree on field names and types, so the record is kept as an
/// untyped JSON value until it crosses the normalization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateRelease(pub Value);

impl CandidateRelease {
    /// Build a candidate with the canonical field names.
    pub fn new(title: &str, hash: &str, size: u64) -> Self {
        let mut map = Map::new();
        map.insert("title".to_string(), Value::from(title));
        map.insert("hash".to_string(), Value::from(hash));
        map.insert("size".to_string(), Value::from(size));
        Self(Value::Object(map))
    }

    /// Set an arbitrary field, returning the updated candidate.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    /// First present, non-null value among the given aliases.
    pub(crate) fn field(&self, aliases: &[&str]) -> Option<&Value> {
        let map = self.0.as_object()?;
        aliases
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| !v.is_null())
    }
}

impl From<Value> for CandidateRelease {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A release after crossing the normalization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRelease {
    /// Release title.
    pub name: String,
    /// Info hash (lowercase hex) - unique key for the whole run.
    pub info_hash: String,
    /// Size in bytes (0 if unknown).
    pub size_bytes: u64,
    /// Seeders (0 if unknown).
    #[serde(default)]
    pub seeders: u32,
    pub category: QualityCategory,
    pub resolution: Resolution,
    pub codec: Codec,
    /// Scraper/tracker the release came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
