//! Episode-scoped requests.
//!
//! Titles are classified against the requested episode before any probe
//! call is made: single episodes go through per-item verification, season
//! and multi-season archives go through pack inspection, and everything
//! else is dropped.

mod relevance;
mod types;

pub use relevance::{classify_relevance, EpisodeRelevance};
pub use types::EpisodeInfo;
