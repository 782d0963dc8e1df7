//! Per-file probing along a tier walk.

use tracing::{debug, trace};

use crate::episode::{classify_relevance, EpisodeRelevance};
use crate::metrics;
use crate::quota::Rejection;
use crate::release::NormalizedRelease;

use super::run::{CallResult, ProbeMethod, ProbeRun};
use super::types::{ResultRecord, VerificationSource, WalkOutcome};

impl ProbeRun<'_> {
    /// Walk releases in order, verifying each one that is still wanted.
    ///
    /// Checks run in a fixed order and stop at the first failure: episode
    /// relevance, priority toggles, ledger admission (codec cap, quota,
    /// resolution cap), early exit. Only then is the handler consulted.
    pub async fn walk(&mut self, releases: &[&NormalizedRelease]) -> WalkOutcome {
        for release in releases {
            if self.is_stopped() {
                return WalkOutcome::Cancelled;
            }
            if !self.visited.insert(release.info_hash.clone()) {
                continue;
            }

            if let Some(episode) = self.episode {
                match classify_relevance(&release.name, &episode) {
                    EpisodeRelevance::SpecificEpisode => {}
                    EpisodeRelevance::Irrelevant => {
                        trace!(name = %release.name, "Skipping release for another episode");
                        metrics::CANDIDATES_SKIPPED
                            .with_label_values(&["irrelevant"])
                            .inc();
                        continue;
                    }
                    // Packs are only verified by inspection.
                    EpisodeRelevance::SeasonPack | EpisodeRelevance::RelevantMultiSeasonPack => {
                        continue
                    }
                }
            }

            if !self.passes_priorities(&release.name) {
                metrics::CANDIDATES_SKIPPED
                    .with_label_values(&["priority"])
                    .inc();
                continue;
            }

            if let Err(rejection) = self.ledger.admit(release) {
                metrics::CANDIDATES_SKIPPED
                    .with_label_values(&[rejection_label(&rejection)])
                    .inc();
                continue;
            }

            if self.early_exit_reached() {
                debug!("Remux and BluRay quotas met at 2160p and 1080p, stopping walk");
                return WalkOutcome::EarlyExit;
            }

            match self.verify(release).await {
                CallResult::Ok(Some(from)) => self.accept(release, from),
                CallResult::Ok(None) | CallResult::Failed => {}
                CallResult::Cancelled => return WalkOutcome::Cancelled,
            }
        }

        WalkOutcome::Completed
    }

    /// Batch membership first, then a live check if the handler has one.
    async fn verify(
        &mut self,
        release: &NormalizedRelease,
    ) -> CallResult<Option<VerificationSource>> {
        if self.batch_cached.contains(&release.info_hash) {
            return CallResult::Ok(Some(VerificationSource::ApiBatch));
        }
        if !self.capabilities.live_check {
            return CallResult::Ok(None);
        }
        if !self.take_live_check() {
            trace!(hash = %release.info_hash, "Live check budget exhausted");
            return CallResult::Ok(None);
        }

        let handler = self.handler;
        match self
            .guarded(ProbeMethod::Live, handler.live_check_hash(&release.info_hash))
            .await
        {
            CallResult::Ok(true) => CallResult::Ok(Some(VerificationSource::ApiLive)),
            CallResult::Ok(false) => CallResult::Ok(None),
            CallResult::Failed => CallResult::Failed,
            CallResult::Cancelled => CallResult::Cancelled,
        }
    }

    fn accept(&mut self, release: &NormalizedRelease, from: VerificationSource) {
        debug!(
            name = %release.name,
            category = %release.category,
            resolution = %release.resolution,
            from = %from,
            "Accepted cached release"
        );
        self.ledger
            .record(release.category, release.resolution, release.codec);
        metrics::RELEASES_ACCEPTED
            .with_label_values(&[from.metric_label()])
            .inc();
        self.results.push(ResultRecord::new(release.clone(), from));
    }
}

pub(crate) fn rejection_label(rejection: &Rejection) -> &'static str {
    match rejection {
        Rejection::CodecCap { .. } => "codec_cap",
        Rejection::QuotaFull { .. } => "quota_full",
        Rejection::ResolutionCap { .. } => "resolution_cap",
    }
}
