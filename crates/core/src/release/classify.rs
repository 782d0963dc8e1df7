//! Title classification: quality category, resolution and codec.
//!
//! The engine only relies on the [`Classifier`] contract; callers can swap in
//! their own vocabulary. [`DefaultClassifier`] ships a conservative one.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{Codec, QualityCategory, Resolution};

static AUDIO_PENALTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^a-z0-9])(?:aac|opus)(?:$|[^a-z])").unwrap());
static REMUX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)remux").unwrap());
static WEBRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)web[ ._-]?rip|br[ ._-]?rip").unwrap());
static BLURAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)blu[ ._-]?ray|\bbd(?:rip|mv|25|50)?\b").unwrap());
static WEBDL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)web[ ._-]?dl|\bweb\b").unwrap());

static RES_2160: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)2160p|\b4k\b|\buhd\b").unwrap());
static RES_1080: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)1080[pi]").unwrap());
static RES_720: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)720p").unwrap());
static RES_480: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)480p").unwrap());

static H265: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[xh][ .]?265|hevc").unwrap());
static H264: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[xh][ .]?264|\bavc\b").unwrap());

/// Pure title -> category / resolution mapping.
///
/// Implementations must be deterministic, case-insensitive and total:
/// anything unrecognized maps to `Other`.
pub trait Classifier: Send + Sync {
    fn classify_category(&self, name: &str) -> QualityCategory;

    fn classify_resolution(&self, name: &str) -> Resolution;
}

/// Regex-backed classifier.
#[derive(Debug, Clone, Copy)]
pub struct DefaultClassifier {
    /// Classify AAC/Opus releases as `AudioFocused` ahead of any source tag.
    pub audio_penalty: bool,
}

impl DefaultClassifier {
    pub fn new(audio_penalty: bool) -> Self {
        Self { audio_penalty }
    }
}

impl Default for DefaultClassifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Classifier for DefaultClassifier {
    fn classify_category(&self, name: &str) -> QualityCategory {
        if self.audio_penalty && has_penalized_audio(name) {
            QualityCategory::AudioFocused
        } else if REMUX.is_match(name) {
            QualityCategory::Remux
        } else if is_webrip_class(name) {
            QualityCategory::WebRip
        } else if BLURAY.is_match(name) {
            QualityCategory::BluRay
        } else if WEBDL.is_match(name) {
            QualityCategory::WebDl
        } else {
            QualityCategory::Other
        }
    }

    fn classify_resolution(&self, name: &str) -> Resolution {
        if RES_2160.is_match(name) {
            Resolution::P2160
        } else if RES_1080.is_match(name) {
            Resolution::P1080
        } else if RES_720.is_match(name) {
            Resolution::P720
        } else if RES_480.is_match(name) {
            Resolution::P480
        } else {
            Resolution::Other
        }
    }
}

/// Codec family of a title.
pub fn classify_codec(name: &str) -> Codec {
    if H265.is_match(name) {
        Codec::H265
    } else if H264.is_match(name) {
        Codec::H264
    } else {
        Codec::Unknown
    }
}

/// WebRip/BRRip-class release.
pub fn is_webrip_class(name: &str) -> bool {
    WEBRIP.is_match(name)
}

/// Title advertises an AAC or Opus audio track.
pub fn has_penalized_audio(name: &str) -> bool {
    AUDIO_PENALTY.is_match(name)
}
