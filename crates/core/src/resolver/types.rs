use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::episode::EpisodeInfo;
use crate::probe::{ProbeStats, ResultRecord, WalkOutcome};
use crate::quota::{LedgerSnapshot, SatisfiedQuotas};
use crate::tiers::TierName;

/// Per-run inputs besides the candidates and the handler.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    /// Restrict the run to one episode.
    pub episode: Option<EpisodeInfo>,
    /// Slots already filled by the caller's inventory.
    pub satisfied: SatisfiedQuotas,
    /// Cancelling stops new handler calls; accumulated results are kept.
    pub cancel: CancellationToken,
}

impl ResolveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_episode(mut self, episode: EpisodeInfo) -> Self {
        self.episode = Some(episode);
        self
    }

    pub fn with_satisfied(mut self, satisfied: SatisfiedQuotas) -> Self {
        self.satisfied = satisfied;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every phase ran (or was skipped) normally.
    Completed,
    /// Remux and BluRay quotas were met at 2160p and 1080p.
    EarlyExit,
    /// Cancelled by the caller or aborted by the handler.
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::EarlyExit => "early_exit",
            StopReason::Cancelled => "cancelled",
        }
    }

    pub(crate) fn from_walk(outcome: WalkOutcome) -> Option<Self> {
        match outcome {
            WalkOutcome::Completed => None,
            WalkOutcome::EarlyExit => Some(StopReason::EarlyExit),
            WalkOutcome::Cancelled => Some(StopReason::Cancelled),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Run phases, in the order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NormalizeAndGroup,
    InitialBatchCheck,
    HighRes,
    SeasonPacks,
    LowRes,
    /// One tier of the flat walk.
    Tier(TierName),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NormalizeAndGroup => write!(f, "normalize_and_group"),
            Phase::InitialBatchCheck => write!(f, "initial_batch_check"),
            Phase::HighRes => write!(f, "high_res"),
            Phase::SeasonPacks => write!(f, "season_packs"),
            Phase::LowRes => write!(f, "low_res"),
            Phase::Tier(tier) => write!(f, "tier_{}", tier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Ran,
    Skipped,
    /// Stopped part-way by early exit or cancellation.
    Interrupted,
}

/// What one phase did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub status: PhaseStatus,
    /// Results accepted during this phase.
    pub accepted: usize,
}

impl PhaseReport {
    pub fn new(phase: Phase, status: PhaseStatus, accepted: usize) -> Self {
        Self {
            phase,
            status,
            accepted,
        }
    }

    pub fn skipped(phase: Phase) -> Self {
        Self::new(phase, PhaseStatus::Skipped, 0)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveOutcome {
    /// Accepted results, in acceptance order.
    pub results: Vec<ResultRecord>,
    pub ledger: LedgerSnapshot,
    pub stop_reason: StopReason,
    pub phases: Vec<PhaseReport>,
    pub probe_stats: ProbeStats,
}

impl ResolveOutcome {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::HighRes.to_string(), "high_res");
        assert_eq!(Phase::Tier(TierName::LastResort).to_string(), "tier_last_resort");
    }

    #[test]
    fn test_stop_reason_from_walk() {
        assert_eq!(StopReason::from_walk(WalkOutcome::Completed), None);
        assert_eq!(
            StopReason::from_walk(WalkOutcome::EarlyExit),
            Some(StopReason::EarlyExit)
        );
        assert_eq!(
            serde_json::to_string(&StopReason::EarlyExit).unwrap(),
            "\"early_exit\""
        );
    }

    #[test]
    fn test_request_builder() {
        let cancel = CancellationToken::new();
        let request = ResolveRequest::new()
            .for_episode(EpisodeInfo::new(1, 2))
            .with_cancel(cancel.clone());
        cancel.cancel();

        assert_eq!(request.episode, Some(EpisodeInfo::new(1, 2)));
        assert!(request.satisfied.is_empty());
        assert!(request.cancel.is_cancelled());
    }
}
