//! Per-run probe state shared by the tier walk and season-pack inspection.

use std::collections::HashSet;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::episode::EpisodeInfo;
use crate::handler::{CacheHandler, HandlerCapabilities, HandlerError};
use crate::metrics;
use crate::quota::QuotaLedger;
use crate::release::{has_penalized_audio, is_webrip_class, QualityCategory, Resolution};

use super::types::{ProbeStats, ResultSet};

/// Categories whose 2160p and 1080p buckets end the run once full.
const EARLY_EXIT_CATEGORIES: [QualityCategory; 2] =
    [QualityCategory::Remux, QualityCategory::BluRay];

/// Result of a single guarded handler call.
pub(crate) enum CallResult<T> {
    Ok(T),
    Failed,
    Cancelled,
}

/// Which handler operation a call goes to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ProbeMethod {
    Batch,
    Live,
    SeasonPack,
}

impl ProbeMethod {
    fn as_str(&self) -> &'static str {
        match self {
            ProbeMethod::Batch => "batch",
            ProbeMethod::Live => "live",
            ProbeMethod::SeasonPack => "season_pack",
        }
    }
}

/// Everything one resolver run owns while it probes.
///
/// Never shared between runs: each run builds its own ledger and trackers.
pub struct ProbeRun<'a> {
    pub(crate) handler: &'a dyn CacheHandler,
    pub(crate) config: &'a ResolverConfig,
    pub(crate) episode: Option<EpisodeInfo>,
    pub(crate) capabilities: HandlerCapabilities,
    pub(crate) ledger: QuotaLedger,
    pub(crate) results: ResultSet,
    pub(crate) stats: ProbeStats,
    pub(crate) batch_cached: HashSet<String>,
    pub(crate) visited: HashSet<String>,
    cancel: CancellationToken,
    live_checks_left: Option<u32>,
}

impl<'a> ProbeRun<'a> {
    pub fn new(
        handler: &'a dyn CacheHandler,
        config: &'a ResolverConfig,
        ledger: QuotaLedger,
        episode: Option<EpisodeInfo>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            capabilities: handler.capabilities(),
            handler,
            config,
            episode,
            ledger,
            results: ResultSet::new(),
            stats: ProbeStats::default(),
            batch_cached: HashSet::new(),
            visited: HashSet::new(),
            cancel,
            live_checks_left: config.max_live_checks,
        }
    }

    pub fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn stats(&self) -> ProbeStats {
        self.stats
    }

    pub fn into_parts(self) -> (ResultSet, QuotaLedger, ProbeStats) {
        (self.results, self.ledger, self.stats)
    }

    /// Caller cancellation or handler abort.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.handler.is_aborted()
    }

    /// Remux and BluRay full at 2160p and 1080p. Never true in bypass mode.
    pub fn early_exit_reached(&self) -> bool {
        self.ledger
            .all_satisfied(&EARLY_EXIT_CATEGORIES, &Resolution::HIGH)
    }

    /// Release-class toggles.
    pub(crate) fn passes_priorities(&self, name: &str) -> bool {
        let priorities = &self.config.priorities;
        if !priorities.allow_webrip && is_webrip_class(name) {
            return false;
        }
        if !priorities.allow_aac_opus && has_penalized_audio(name) {
            return false;
        }
        true
    }

    /// The single up-front batched existence check.
    ///
    /// A failed call leaves the batch set empty; live checks take over.
    pub(crate) async fn initial_batch_check(&mut self, hashes: &[String]) -> CallResult<usize> {
        if hashes.is_empty() {
            return CallResult::Ok(0);
        }
        let handler = self.handler;
        match self
            .guarded(ProbeMethod::Batch, handler.check_cached_hashes(hashes))
            .await
        {
            CallResult::Ok(cached) => {
                // Only keep hashes that were asked about.
                let asked: HashSet<&str> = hashes.iter().map(String::as_str).collect();
                self.batch_cached = cached
                    .into_iter()
                    .map(|h| h.to_lowercase())
                    .filter(|h| asked.contains(h.as_str()))
                    .collect();
                debug!(
                    asked = hashes.len(),
                    cached = self.batch_cached.len(),
                    "Batch existence check finished"
                );
                CallResult::Ok(self.batch_cached.len())
            }
            CallResult::Failed => CallResult::Failed,
            CallResult::Cancelled => CallResult::Cancelled,
        }
    }

    /// Take one unit of the live-check budget, if any is left.
    pub(crate) fn take_live_check(&mut self) -> bool {
        match self.live_checks_left.as_mut() {
            None => true,
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                true
            }
        }
    }

    /// Run a handler call, racing it against cancellation.
    ///
    /// Errors are logged, counted and reported as [`CallResult::Failed`].
    pub(crate) async fn guarded<T, F>(&mut self, method: ProbeMethod, call: F) -> CallResult<T>
    where
        F: Future<Output = Result<T, HandlerError>>,
    {
        match method {
            ProbeMethod::Batch => self.stats.batch_calls += 1,
            ProbeMethod::Live => self.stats.live_calls += 1,
            ProbeMethod::SeasonPack => self.stats.pack_calls += 1,
        }
        let _timer = metrics::PROBE_DURATION
            .with_label_values(&[method.as_str()])
            .start_timer();

        // Cancellation wins over a call that is already ready.
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = call => Some(result),
        };

        match outcome {
            None => {
                debug!(method = method.as_str(), "Handler call cancelled");
                CallResult::Cancelled
            }
            Some(Ok(value)) => {
                metrics::PROBE_CALLS
                    .with_label_values(&[method.as_str(), "ok"])
                    .inc();
                CallResult::Ok(value)
            }
            Some(Err(e)) => {
                self.stats.failed_calls += 1;
                metrics::PROBE_CALLS
                    .with_label_values(&[method.as_str(), e.kind()])
                    .inc();
                warn!(
                    "{} {} call failed, treating as not cached: {}",
                    self.handler.identifier(),
                    method.as_str(),
                    e
                );
                CallResult::Failed
            }
        }
    }
}
