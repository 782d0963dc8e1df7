//! Normalization boundary: raw candidate records -> [`NormalizedRelease`].
//!
//! Everything downstream of this module only sees the strict normalized
//! type. Missing optional fields degrade to defaults; records without a
//! usable name or info hash are dropped.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::classify::{classify_codec, Classifier};
use super::types::{CandidateRelease, NormalizedRelease};

const TITLE_FIELDS: &[&str] = &["title", "name", "Title"];
const HASH_FIELDS: &[&str] = &["hash", "infoHash", "InfoHash", "info_hash"];
const MAGNET_FIELDS: &[&str] = &["magnet", "magnetUri", "magnet_uri", "MagnetUri"];
const SIZE_FIELDS: &[&str] = &["size", "Size", "filesize", "fileSize"];
const SEEDER_FIELDS: &[&str] = &["seeders", "Seeders", "seeds"];
const SOURCE_FIELDS: &[&str] = &["source", "tracker", "Tracker"];

/// Normalize a single raw record.
///
/// Returns `None` when the record has no usable name or info hash.
pub fn normalize_release(
    candidate: &CandidateRelease,
    classifier: &dyn Classifier,
) -> Option<NormalizedRelease> {
    let name = candidate
        .field(TITLE_FIELDS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let info_hash = candidate
        .field(HASH_FIELDS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .or_else(|| {
            candidate
                .field(MAGNET_FIELDS)
                .and_then(Value::as_str)
                .and_then(hash_from_magnet)
        })?;

    let size_bytes = candidate.field(SIZE_FIELDS).map(coerce_u64).unwrap_or(0);
    let seeders = candidate
        .field(SEEDER_FIELDS)
        .map(coerce_u64)
        .map(|s| s.min(u32::MAX as u64) as u32)
        .unwrap_or(0);
    let source = candidate
        .field(SOURCE_FIELDS)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(NormalizedRelease {
        category: classifier.classify_category(&name),
        resolution: classifier.classify_resolution(&name),
        codec: classify_codec(&name),
        name,
        info_hash,
        size_bytes,
        seeders,
        source,
    })
}

/// Normalize a batch of raw records.
///
/// Malformed records are dropped and duplicates (by info hash) keep their
/// first occurrence, so the output order follows the input order.
pub fn normalize_all(
    candidates: &[CandidateRelease],
    classifier: &dyn Classifier,
) -> Vec<NormalizedRelease> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut releases = Vec::with_capacity(candidates.len());
    let mut malformed = 0usize;
    let mut duplicates = 0usize;

    for candidate in candidates {
        match normalize_release(candidate, classifier) {
            Some(release) => {
                if seen.insert(release.info_hash.clone()) {
                    releases.push(release);
                } else {
                    duplicates += 1;
                }
            }
            None => malformed += 1,
        }
    }

    debug!(
        input = candidates.len(),
        kept = releases.len(),
        malformed,
        duplicates,
        "Normalized candidate releases"
    );

    releases
}

/// Lenient numeric coercion: numbers and numeric strings, anything else is 0.
fn coerce_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f as u64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Extract the `btih` info hash from a magnet URI.
fn hash_from_magnet(magnet: &str) -> Option<String> {
    let lower = magnet.to_lowercase();
    let start = lower.find("urn:btih:")? + "urn:btih:".len();
    let hash: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if hash.is_empty() {
        None
    } else {
        Some(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{DefaultClassifier, QualityCategory, Resolution};
    use serde_json::json;

    fn normalize(value: Value) -> Option<NormalizedRelease> {
        normalize_release(&CandidateRelease::from(value), &DefaultClassifier::default())
    }

    #[test]
    fn test_normalize_canonical_fields() {
        let release = normalize(json!({
            "title": "Movie.2020.2160p.BluRay.REMUX.HEVC",
            "hash": "ABCDEF0123",
            "size": 50_000_000_000u64,
            "seeders": 42,
            "source": "tracker-a"
        }))
        .unwrap();

        assert_eq!(release.name, "Movie.2020.2160p.BluRay.REMUX.HEVC");
        assert_eq!(release.info_hash, "abcdef0123");
        assert_eq!(release.size_bytes, 50_000_000_000);
        assert_eq!(release.seeders, 42);
        assert_eq!(release.category, QualityCategory::Remux);
        assert_eq!(release.resolution, Resolution::P2160);
        assert_eq!(release.source.as_deref(), Some("tracker-a"));
    }

    #[test]
    fn test_normalize_aliased_fields() {
        let release = normalize(json!({
            "Title": "Movie 1080p WEB-DL",
            "InfoHash": "FFEE",
            "fileSize": "1234"
        }))
        .unwrap();

        assert_eq!(release.info_hash, "ffee");
        assert_eq!(release.size_bytes, 1234);
        assert_eq!(release.seeders, 0);
        assert!(release.source.is_none());
    }

    #[test]
    fn test_normalize_bad_size_defaults_to_zero() {
        for size in [json!("huge"), json!(-5), json!(null), json!([1])] {
            let release = normalize(json!({"name": "x", "infoHash": "aa", "size": size})).unwrap();
            assert_eq!(release.size_bytes, 0);
        }
        let release = normalize(json!({"name": "x", "hash": "aa", "filesize": 12.7})).unwrap();
        assert_eq!(release.size_bytes, 12);
    }

    #[test]
    fn test_normalize_drops_missing_hash_or_name() {
        assert!(normalize(json!({"title": "Movie"})).is_none());
        assert!(normalize(json!({"hash": "abc"})).is_none());
        assert!(normalize(json!({"title": "  ", "hash": "abc"})).is_none());
        assert!(normalize(json!({"title": "Movie", "hash": ""})).is_none());
        assert!(normalize(json!("not an object")).is_none());
    }

    #[test]
    fn test_normalize_hash_from_magnet() {
        let release = normalize(json!({
            "title": "Movie",
            "magnet": "magnet:?xt=urn:btih:ABC123DEF&dn=Movie"
        }))
        .unwrap();
        assert_eq!(release.info_hash, "abc123def");
    }

    #[test]
    fn test_normalize_all_dedups_keeping_first() {
        let candidates = vec![
            CandidateRelease::new("First 1080p BluRay", "AAA", 10),
            CandidateRelease::from(json!({"title": "broken"})),
            CandidateRelease::new("Second 720p", "aaa", 20),
            CandidateRelease::new("Third 720p", "bbb", 30),
        ];
        let releases = normalize_all(&candidates, &DefaultClassifier::default());

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].name, "First 1080p BluRay");
        assert_eq!(releases[1].info_hash, "bbb");
    }
}
