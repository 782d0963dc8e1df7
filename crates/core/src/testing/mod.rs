//! Testing utilities: a mock cache handler and release fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use cachepick_core::testing::{fixtures, MockCacheHandler};
//!
//! let handler = MockCacheHandler::new().with_cached(&["abc"]);
//! let candidates = vec![fixtures::candidate("Movie.2160p.BluRay.REMUX", "abc")];
//! ```

mod mock_cache_handler;

pub use mock_cache_handler::{MockCacheHandler, RecordedPackCheck};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::handler::SeasonPackHint;
    use crate::release::{
        classify_codec, CandidateRelease, Codec, NormalizedRelease, QualityCategory, Resolution,
    };

    /// Create a raw candidate with the canonical field names and a 2 GB size.
    pub fn candidate(title: &str, hash: &str) -> CandidateRelease {
        CandidateRelease::new(title, hash, 2 * 1024 * 1024 * 1024)
    }

    /// Create a normalized release with a neutral name.
    pub fn normalized(
        hash: &str,
        category: QualityCategory,
        resolution: Resolution,
        size_bytes: u64,
        seeders: u32,
    ) -> NormalizedRelease {
        NormalizedRelease {
            name: format!("Release.{}.{}.{}", hash, resolution, category),
            info_hash: hash.to_string(),
            size_bytes,
            seeders,
            category,
            resolution,
            codec: Codec::Unknown,
            source: None,
        }
    }

    /// Create a normalized release with an explicit title.
    pub fn named(
        hash: &str,
        name: &str,
        category: QualityCategory,
        resolution: Resolution,
    ) -> NormalizedRelease {
        NormalizedRelease {
            name: name.to_string(),
            info_hash: hash.to_string(),
            size_bytes: 1024 * 1024 * 1024, // 1 GB
            seeders: 10,
            category,
            resolution,
            codec: classify_codec(name),
            source: None,
        }
    }

    /// Create a season-pack hint pointing at the first file.
    pub fn pack_hint(file_path: &str) -> SeasonPackHint {
        SeasonPackHint {
            file_index: Some(0),
            file_id: None,
            file_path: file_path.to_string(),
            file_bytes: 1_500_000_000,
        }
    }
}
