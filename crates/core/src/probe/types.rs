use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handler::SeasonPackHint;
use crate::release::NormalizedRelease;

/// How a result was confirmed as cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationSource {
    /// Present in the up-front batched existence check.
    #[serde(rename = "API Batch")]
    ApiBatch,
    /// Confirmed by a single-item live check.
    #[serde(rename = "API Live")]
    ApiLive,
    /// Season pack confirmed to contain the requested episode.
    #[serde(rename = "Batch Pack Inspection")]
    BatchPackInspection,
}

impl VerificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationSource::ApiBatch => "API Batch",
            VerificationSource::ApiLive => "API Live",
            VerificationSource::BatchPackInspection => "Batch Pack Inspection",
        }
    }

    /// Label for metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            VerificationSource::ApiBatch => "api_batch",
            VerificationSource::ApiLive => "api_live",
            VerificationSource::BatchPackInspection => "batch_pack_inspection",
        }
    }
}

impl fmt::Display for VerificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A release confirmed as cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(flatten)]
    pub release: NormalizedRelease,
    pub is_cached: bool,
    pub from: VerificationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_file_hint: Option<SeasonPackHint>,
}

impl ResultRecord {
    pub fn new(release: NormalizedRelease, from: VerificationSource) -> Self {
        Self {
            release,
            is_cached: true,
            from,
            episode_file_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<SeasonPackHint>) -> Self {
        self.episode_file_hint = hint;
        self
    }

    pub fn info_hash(&self) -> &str {
        &self.release.info_hash
    }
}

/// Accepted results in acceptance order, unique by info hash.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<ResultRecord>,
    hashes: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResultRecord) {
        let fresh = self.hashes.insert(record.release.info_hash.clone());
        debug_assert!(fresh, "duplicate info hash {}", record.release.info_hash);
        if fresh {
            self.records.push(record);
        }
    }

    pub fn contains(&self, info_hash: &str) -> bool {
        self.hashes.contains(info_hash)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn into_vec(self) -> Vec<ResultRecord> {
        self.records
    }
}

/// How a walk (or pack inspection) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed,
    /// Remux and BluRay are full at 2160p and 1080p.
    EarlyExit,
    /// Cancelled by the caller or aborted by the handler.
    Cancelled,
}

/// Handler call counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStats {
    pub batch_calls: u32,
    pub live_calls: u32,
    pub pack_calls: u32,
    /// Calls that returned an error (any method).
    pub failed_calls: u32,
}

impl ProbeStats {
    pub fn total_calls(&self) -> u32 {
        self.batch_calls + self.live_calls + self.pack_calls
    }
}
