use serde::{Deserialize, Serialize};

use crate::quota::{CodecCaps, QuotaLimits, ResolutionCaps};
use crate::tiers::{SortPolicy, TraversalMode};

/// Root configuration for a [`CacheResolver`](crate::CacheResolver).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub quotas: QuotaConfig,
    #[serde(default)]
    pub priorities: PriorityConfig,
    #[serde(default)]
    pub season_packs: SeasonPackConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    /// Upper bound on single-item live checks per run. Unbounded if unset.
    #[serde(default)]
    pub max_live_checks: Option<u32>,
}

/// Quota limits and caps
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuotaConfig {
    #[serde(default)]
    pub limits: QuotaLimits,
    #[serde(default)]
    pub resolution_caps: ResolutionCaps,
    #[serde(default)]
    pub codec_caps: CodecCaps,
}

/// Release-class toggles applied before any probe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PriorityConfig {
    /// Accept WebRip/BRRip-class releases.
    #[serde(default = "default_true")]
    pub allow_webrip: bool,
    /// Accept releases advertising AAC or Opus audio.
    #[serde(default = "default_true")]
    pub allow_aac_opus: bool,
    /// Classify AAC/Opus releases as audio-focused.
    #[serde(default = "default_true")]
    pub audio_penalty: bool,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            allow_webrip: default_true(),
            allow_aac_opus: default_true(),
            audio_penalty: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Season-pack inspection budget
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeasonPackConfig {
    /// Packs per inspection round (one handler call each).
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Maximum inspection rounds per run.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    /// Stop inspecting once this many packs were accepted.
    #[serde(default = "default_target_packs")]
    pub target_packs: usize,
}

impl Default for SeasonPackConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            max_rounds: default_max_rounds(),
            target_packs: default_target_packs(),
        }
    }
}

fn default_window_size() -> usize {
    5
}

fn default_max_rounds() -> usize {
    3
}

fn default_target_packs() -> usize {
    2
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TraversalConfig {
    #[serde(default)]
    pub mode: TraversalMode,
    #[serde(default)]
    pub sort: SortPolicy,
}
