//! Candidate releases and the normalization boundary.
//!
//! Raw scraper records come in as [`CandidateRelease`] (any JSON shape),
//! are classified by a [`Classifier`], and leave as [`NormalizedRelease`].

mod classify;
mod normalize;
mod types;

pub use classify::{
    classify_codec, has_penalized_audio, is_webrip_class, Classifier, DefaultClassifier,
};
pub use normalize::{normalize_all, normalize_release};
pub use types::*;
