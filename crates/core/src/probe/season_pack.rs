//! Speculative season-pack inspection.
//!
//! Pack candidates are ranked once, then inspected in fixed-size windows with
//! one handler call per window. The number of calls is bounded by
//! `max_rounds` no matter how many packs the scrapers returned.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::episode::classify_relevance;
use crate::metrics;
use crate::release::NormalizedRelease;
use crate::tiers::TierGroups;

use super::orchestrator::rejection_label;
use super::run::{CallResult, ProbeMethod, ProbeRun};
use super::types::{ResultRecord, VerificationSource, WalkOutcome};

impl ProbeRun<'_> {
    /// Pack candidates in inspection order.
    ///
    /// Only packs that could still be accepted are kept: not already a
    /// result, allowed by the priority toggles, and with quota left.
    pub fn rank_season_packs<'g>(&self, groups: &'g TierGroups) -> Vec<&'g NormalizedRelease> {
        let Some(episode) = self.episode else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut packs: Vec<&NormalizedRelease> = groups
            .iter()
            .filter(|r| classify_relevance(&r.name, &episode).is_pack())
            .filter(|r| !self.results.contains(&r.info_hash))
            .filter(|r| self.passes_priorities(&r.name))
            .filter(|r| {
                self.ledger.is_bypassed() || self.ledger.remaining(r.category, r.resolution) > 0
            })
            .filter(|r| seen.insert(r.info_hash.clone()))
            .collect();
        packs.sort_by(|a, b| rank(a, b));
        packs
    }

    /// Inspect ranked packs in rounds until enough are accepted.
    pub async fn probe_season_packs(&mut self, groups: &TierGroups) -> WalkOutcome {
        let Some(episode) = self.episode else {
            return WalkOutcome::Completed;
        };
        if !self.capabilities.season_packs {
            return WalkOutcome::Completed;
        }

        let packs = self.rank_season_packs(groups);
        if packs.is_empty() {
            debug!("No season pack candidates to inspect");
            return WalkOutcome::Completed;
        }

        let settings = &self.config.season_packs;
        let (window_size, max_rounds, target) = (
            settings.window_size.max(1),
            settings.max_rounds,
            settings.target_packs,
        );
        let mut accepted = 0usize;

        for (round, window) in packs.chunks(window_size).take(max_rounds).enumerate() {
            if accepted >= target {
                break;
            }
            if self.is_stopped() {
                return WalkOutcome::Cancelled;
            }
            if self.early_exit_reached() {
                return WalkOutcome::EarlyExit;
            }

            let hashes: Vec<String> = window.iter().map(|r| r.info_hash.clone()).collect();
            let handler = self.handler;
            let confirmed: HashMap<String, _> = match self
                .guarded(
                    ProbeMethod::SeasonPack,
                    handler.batch_check_season_packs(&hashes, episode.season, episode.episode),
                )
                .await
            {
                CallResult::Ok(confirmed) => confirmed
                    .into_iter()
                    .map(|(hash, hint)| (hash.to_lowercase(), hint))
                    .collect(),
                CallResult::Failed => continue,
                CallResult::Cancelled => return WalkOutcome::Cancelled,
            };

            debug!(
                round = round + 1,
                inspected = hashes.len(),
                confirmed = confirmed.len(),
                "Season pack round finished"
            );

            for pack in window {
                if accepted >= target {
                    break;
                }
                let Some(hint) = confirmed.get(&pack.info_hash) else {
                    continue;
                };
                if self.results.contains(&pack.info_hash) {
                    continue;
                }
                if let Err(rejection) = self.ledger.admit(pack) {
                    metrics::CANDIDATES_SKIPPED
                        .with_label_values(&[rejection_label(&rejection)])
                        .inc();
                    continue;
                }

                info!(name = %pack.name, episode = %episode, "Accepted season pack");
                self.ledger.record(pack.category, pack.resolution, pack.codec);
                self.visited.insert(pack.info_hash.clone());
                metrics::RELEASES_ACCEPTED
                    .with_label_values(&[VerificationSource::BatchPackInspection.metric_label()])
                    .inc();
                self.results.push(
                    ResultRecord::new((*pack).clone(), VerificationSource::BatchPackInspection)
                        .with_hint(hint.clone()),
                );
                accepted += 1;
            }
        }

        WalkOutcome::Completed
    }
}

/// Quality, then resolution, then size (all descending), then hash.
fn rank(a: &NormalizedRelease, b: &NormalizedRelease) -> Ordering {
    b.category
        .quality_score()
        .cmp(&a.category.quality_score())
        .then_with(|| {
            b.resolution
                .resolution_score()
                .cmp(&a.resolution.resolution_score())
        })
        .then_with(|| b.size_bytes.cmp(&a.size_bytes))
        .then_with(|| a.info_hash.cmp(&b.info_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::episode::EpisodeInfo;
    use crate::handler::{HandlerCapabilities, HandlerError, SeasonPackHint};
    use crate::quota::{QuotaLedger, SatisfiedQuotas};
    use crate::release::{QualityCategory, Resolution};
    use crate::testing::fixtures::{named, pack_hint};
    use crate::testing::MockCacheHandler;
    use crate::tiers::SortPolicy;
    use tokio_util::sync::CancellationToken;

    fn run<'a>(handler: &'a MockCacheHandler, config: &'a ResolverConfig) -> ProbeRun<'a> {
        ProbeRun::new(
            handler,
            config,
            QuotaLedger::new(config.quotas.clone(), SatisfiedQuotas::new(), false),
            Some(EpisodeInfo::new(2, 5)),
            CancellationToken::new(),
        )
    }

    fn packs(count: usize) -> TierGroups {
        let releases = (0..count)
            .map(|i| {
                named(
                    &format!("pack{:02}", i),
                    &format!("Show.S02.1080p.Group{}", i),
                    QualityCategory::Other,
                    Resolution::P1080,
                )
            })
            .collect();
        TierGroups::build(releases, SortPolicy::default())
    }

    #[test]
    fn test_rank_quality_then_resolution_then_size() {
        let handler = MockCacheHandler::new();
        let config = ResolverConfig::default();
        use QualityCategory::{Remux, WebDl};
        use Resolution::{P1080, P2160};

        let mut web = named("web", "Show.S02.2160p.WEB-DL", WebDl, P2160);
        web.size_bytes = 10;
        let mut remux_small = named("remux1", "Show.S02.1080p.REMUX", Remux, P1080);
        remux_small.size_bytes = 1;
        let mut remux_big = named("remux2", "Show.S02.1080p.REMUX", Remux, P1080);
        remux_big.size_bytes = 2;
        let remux_4k = named("remux3", "Show.S02.2160p.REMUX", Remux, P2160);
        let episode = named("ep", "Show.S02E05.2160p.REMUX", Remux, P2160);
        let groups = TierGroups::build(
            vec![web, remux_small, remux_big, remux_4k, episode],
            SortPolicy::default(),
        );

        let ranked: Vec<&str> = run(&handler, &config)
            .rank_season_packs(&groups)
            .iter()
            .map(|r| r.info_hash.as_str())
            .collect();
        assert_eq!(ranked, vec!["remux3", "remux2", "remux1", "web"]);
    }

    #[tokio::test]
    async fn test_rounds_are_bounded() {
        let handler = MockCacheHandler::new().with_capabilities(HandlerCapabilities::full());
        let config = ResolverConfig::default();
        let mut run = run(&handler, &config);

        let outcome = run.probe_season_packs(&packs(40)).await;

        assert_eq!(outcome, WalkOutcome::Completed);
        let calls = handler.pack_checks().await;
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.hashes.len() == 5));
        assert_eq!(calls[0].season, 2);
        assert_eq!(calls[0].episode, 5);
        assert!(run.results().is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_target() {
        let handler = MockCacheHandler::new()
            .with_capabilities(HandlerCapabilities::full())
            .with_pack("pack00", Some(pack_hint("Show/S02E05.mkv")))
            .with_pack("pack01", None)
            .with_pack("pack02", None)
            .with_pack("pack07", None);
        let config = ResolverConfig::default();
        let mut run = run(&handler, &config);

        run.probe_season_packs(&packs(20)).await;

        assert_eq!(handler.pack_checks().await.len(), 1);
        assert_eq!(run.results().len(), 2);
        let first = &run.results().records()[0];
        assert_eq!(first.from, VerificationSource::BatchPackInspection);
        assert_eq!(
            first.episode_file_hint.as_ref().map(|h| h.file_path.as_str()),
            Some("Show/S02E05.mkv")
        );
        assert!(run.results().records()[1].episode_file_hint.is_none());
    }

    #[tokio::test]
    async fn test_quota_still_applies_to_packs() {
        let handler = MockCacheHandler::new()
            .with_capabilities(HandlerCapabilities::full())
            .with_pack("a", None)
            .with_pack("b", None);
        let mut config = ResolverConfig::default();
        config.season_packs.target_packs = 5;
        let mut run = run(&handler, &config);
        let groups = TierGroups::build(
            vec![
                named("a", "Show.S02.1080p.REMUX", QualityCategory::Remux, Resolution::P1080),
                named("b", "Show.S02.1080p.REMUX.v2", QualityCategory::Remux, Resolution::P1080),
            ],
            SortPolicy::default(),
        );

        run.probe_season_packs(&groups).await;

        assert_eq!(run.results().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_handler_is_skipped() {
        let handler = MockCacheHandler::new()
            .with_pack("pack00", None)
            .with_capabilities(HandlerCapabilities::default());
        let config = ResolverConfig::default();
        let mut run = run(&handler, &config);

        run.probe_season_packs(&packs(3)).await;

        assert!(handler.pack_checks().await.is_empty());
        assert!(run.results().is_empty());
    }

    #[tokio::test]
    async fn test_failed_round_moves_on() {
        let handler = MockCacheHandler::new()
            .with_capabilities(HandlerCapabilities::full())
            .with_pack("pack06", None);
        handler
            .set_next_error(HandlerError::Unavailable("down".into()))
            .await;
        let config = ResolverConfig::default();
        let mut run = run(&handler, &config);

        run.probe_season_packs(&packs(10)).await;

        assert_eq!(handler.pack_checks().await.len(), 2);
        assert_eq!(run.results().len(), 1);
        assert_eq!(run.stats().failed_calls, 1);
    }

    #[tokio::test]
    async fn test_confirmed_hashes_match_case_insensitively() {
        let handler = MockCacheHandler::new()
            .with_pack("pack01", Some(pack_hint("Show/S02E05.mkv")))
            .with_uppercase_responses();
        let config = ResolverConfig::default();
        let mut run = run(&handler, &config);

        run.probe_season_packs(&packs(3)).await;

        assert_eq!(handler.pack_checks().await.len(), 1);
        assert_eq!(run.results().len(), 1);
        let record = &run.results().records()[0];
        assert_eq!(record.info_hash(), "pack01");
        assert!(record.episode_file_hint.is_some());
    }

    #[test]
    fn test_hint_fixture() {
        let hint: SeasonPackHint = pack_hint("a.mkv");
        assert_eq!(hint.file_path, "a.mkv");
    }
}
