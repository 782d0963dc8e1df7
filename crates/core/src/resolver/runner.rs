//! Run controller.
//!
//! Drives one resolver run through its phases:
//! - Normalize and group the candidates
//! - One batched existence check for every per-file candidate
//! - Phased walk (high-res, season packs, low-res) or the flat tier walk
//!
//! Handler cleanup runs exactly once at the end, whatever happened.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ResolverConfig;
use crate::episode::{classify_relevance, EpisodeRelevance};
use crate::handler::CacheHandler;
use crate::metrics;
use crate::probe::{CallResult, ProbeRun, ResultRecord};
use crate::quota::QuotaLedger;
use crate::release::{
    normalize_all, CandidateRelease, Classifier, DefaultClassifier, NormalizedRelease,
    QualityCategory, Resolution,
};
use crate::tiers::{TierGroups, TierName, TraversalMode};

use super::types::{Phase, PhaseReport, PhaseStatus, ResolveOutcome, ResolveRequest, StopReason};

/// Selects a small, diversified set of cached releases from a candidate list.
///
/// Holds only immutable configuration; each call to
/// [`resolve`](CacheResolver::resolve) builds its own ledger, so one resolver
/// can serve concurrent runs.
#[derive(Clone)]
pub struct CacheResolver {
    config: ResolverConfig,
    classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for CacheResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheResolver")
            .field("config", &self.config)
            .field("classifier", &"<classifier>")
            .finish()
    }
}

impl Default for CacheResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl CacheResolver {
    /// Create a resolver using the default title classifier.
    pub fn new(config: ResolverConfig) -> Self {
        let classifier = Arc::new(DefaultClassifier::new(config.priorities.audio_penalty));
        Self { config, classifier }
    }

    /// Replace the title classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run the full pipeline against one handler.
    ///
    /// Handler failures never surface here: they count as cache misses.
    /// A panic inside the run still triggers handler cleanup before it
    /// propagates.
    pub async fn resolve(
        &self,
        candidates: &[CandidateRelease],
        handler: &dyn CacheHandler,
        request: ResolveRequest,
    ) -> ResolveOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("resolve", %run_id, handler = handler.identifier());

        async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(self.run(candidates, handler, request))
                .catch_unwind()
                .await;

            if let Err(e) = handler.cleanup().await {
                warn!("Handler cleanup failed: {}", e);
            }

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            };

            let stop = outcome.stop_reason.as_str();
            metrics::RUNS_TOTAL.with_label_values(&[stop]).inc();
            metrics::RUN_DURATION
                .with_label_values(&[stop])
                .observe(started.elapsed().as_secs_f64());
            info!(
                results = outcome.results.len(),
                stop_reason = stop,
                calls = outcome.probe_stats.total_calls(),
                "Resolve finished"
            );
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        candidates: &[CandidateRelease],
        handler: &dyn CacheHandler,
        request: ResolveRequest,
    ) -> ResolveOutcome {
        let releases = normalize_all(candidates, self.classifier.as_ref());
        let groups = TierGroups::build(releases, self.config.traversal.sort);
        let mut phases = vec![PhaseReport::new(
            Phase::NormalizeAndGroup,
            PhaseStatus::Ran,
            0,
        )];
        info!(
            candidates = candidates.len(),
            releases = groups.len(),
            episode = ?request.episode,
            "Starting resolve"
        );

        let bypass = handler.bypass_quotas();
        if bypass {
            debug!("Handler bypasses quotas");
        }
        let ledger = QuotaLedger::new(self.config.quotas.clone(), request.satisfied, bypass);
        let mut run = ProbeRun::new(handler, &self.config, ledger, request.episode, request.cancel);

        let stop_reason = self.drive(&mut run, &groups, &mut phases).await;
        if stop_reason != StopReason::Completed {
            info!(stop_reason = %stop_reason, "Run stopped early");
        }

        let (results, ledger, probe_stats) = run.into_parts();
        ResolveOutcome {
            results: results.into_vec(),
            ledger: ledger.snapshot(),
            stop_reason,
            phases,
            probe_stats,
        }
    }

    async fn drive(
        &self,
        run: &mut ProbeRun<'_>,
        groups: &TierGroups,
        phases: &mut Vec<PhaseReport>,
    ) -> StopReason {
        if let Some(stop) = checkpoint(run) {
            return stop;
        }

        let hashes = per_file_hashes(run, groups);
        if hashes.is_empty() {
            phases.push(PhaseReport::skipped(Phase::InitialBatchCheck));
        } else {
            match run.initial_batch_check(&hashes).await {
                CallResult::Cancelled => {
                    phases.push(PhaseReport::new(
                        Phase::InitialBatchCheck,
                        PhaseStatus::Interrupted,
                        0,
                    ));
                    return StopReason::Cancelled;
                }
                CallResult::Ok(_) | CallResult::Failed => {
                    phases.push(PhaseReport::new(Phase::InitialBatchCheck, PhaseStatus::Ran, 0));
                }
            }
        }

        match self.config.traversal.mode {
            TraversalMode::Phased => {
                if run
                    .ledger()
                    .all_satisfied(&QualityCategory::HIGH_VALUE, &Resolution::HIGH)
                {
                    debug!("High-value quotas already met at high resolutions");
                    phases.push(PhaseReport::skipped(Phase::HighRes));
                } else {
                    let releases = groups.tiers_at(&Resolution::HIGH);
                    if let Some(stop) = walk_phase(run, Phase::HighRes, &releases, phases).await {
                        return stop;
                    }
                }

                if let Some(stop) = pack_phase(run, groups, phases).await {
                    return stop;
                }

                let excluded = met_high_value_categories(run);
                let releases: Vec<&NormalizedRelease> = groups
                    .tiers_at(&Resolution::LOW)
                    .into_iter()
                    .filter(|r| !excluded.contains(&r.category))
                    .collect();
                if releases.is_empty() {
                    phases.push(PhaseReport::skipped(Phase::LowRes));
                } else if let Some(stop) =
                    walk_phase(run, Phase::LowRes, &releases, phases).await
                {
                    return stop;
                }
            }
            TraversalMode::Flat => {
                for tier in TierName::ALL {
                    let releases = groups.tier(tier);
                    if let Some(stop) = walk_phase(run, Phase::Tier(tier), &releases, phases).await
                    {
                        return stop;
                    }
                }
                if let Some(stop) = pack_phase(run, groups, phases).await {
                    return stop;
                }
            }
        }

        StopReason::Completed
    }
}

/// Stop conditions checked before every phase.
fn checkpoint(run: &ProbeRun<'_>) -> Option<StopReason> {
    if run.is_stopped() {
        Some(StopReason::Cancelled)
    } else if run.early_exit_reached() {
        Some(StopReason::EarlyExit)
    } else {
        None
    }
}

/// Hashes eligible for per-file verification, for the up-front batch check.
fn per_file_hashes(run: &ProbeRun<'_>, groups: &TierGroups) -> Vec<String> {
    groups
        .iter()
        .filter(|r| match run.episode {
            Some(episode) => {
                classify_relevance(&r.name, &episode) == EpisodeRelevance::SpecificEpisode
            }
            None => true,
        })
        .map(|r| r.info_hash.clone())
        .collect()
}

/// High-value categories already full at 2160p or 1080p.
fn met_high_value_categories(run: &ProbeRun<'_>) -> Vec<QualityCategory> {
    let ledger = run.ledger();
    if ledger.is_bypassed() {
        return Vec::new();
    }
    QualityCategory::HIGH_VALUE
        .into_iter()
        .filter(|c| {
            Resolution::HIGH
                .iter()
                .any(|r| ledger.remaining(*c, *r) == 0)
        })
        .collect()
}

async fn walk_phase(
    run: &mut ProbeRun<'_>,
    phase: Phase,
    releases: &[&NormalizedRelease],
    phases: &mut Vec<PhaseReport>,
) -> Option<StopReason> {
    if let Some(stop) = checkpoint(run) {
        return Some(stop);
    }
    debug!(phase = %phase, candidates = releases.len(), "Starting phase");

    let before = run.results().len();
    let outcome = run.walk(releases).await;
    let stop = StopReason::from_walk(outcome);
    let status = if stop.is_some() {
        PhaseStatus::Interrupted
    } else {
        PhaseStatus::Ran
    };
    phases.push(PhaseReport::new(phase, status, run.results().len() - before));
    stop
}

async fn pack_phase(
    run: &mut ProbeRun<'_>,
    groups: &TierGroups,
    phases: &mut Vec<PhaseReport>,
) -> Option<StopReason> {
    if run.episode.is_none() || !run.capabilities.season_packs {
        phases.push(PhaseReport::skipped(Phase::SeasonPacks));
        return None;
    }
    if let Some(stop) = checkpoint(run) {
        return Some(stop);
    }

    let before = run.results().len();
    let outcome = run.probe_season_packs(groups).await;
    let stop = StopReason::from_walk(outcome);
    let status = if stop.is_some() {
        PhaseStatus::Interrupted
    } else {
        PhaseStatus::Ran
    };
    phases.push(PhaseReport::new(
        Phase::SeasonPacks,
        status,
        run.results().len() - before,
    ));
    stop
}

/// Resolve with the default configuration and classifier.
///
/// Returns only the accepted results; use [`CacheResolver::resolve`] for
/// the ledger snapshot and phase reports.
pub async fn resolve_cached_releases(
    candidates: &[CandidateRelease],
    handler: &dyn CacheHandler,
    episode: Option<crate::episode::EpisodeInfo>,
    satisfied: Option<crate::quota::SatisfiedQuotas>,
) -> Vec<ResultRecord> {
    let request = ResolveRequest {
        episode,
        satisfied: satisfied.unwrap_or_default(),
        ..Default::default()
    };
    CacheResolver::default()
        .resolve(candidates, handler, request)
        .await
        .results
}
